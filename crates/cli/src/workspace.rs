//! Filesystem workspace of Gradle builds
//!
//! A directory holding `settings.gradle` or `settings.gradle.kts` is a build.
//! Its settings file names the included projects; the root project plus
//! every included project (and their parents) make up the build. Every module
//! directory that exists on disk is reported as an open project, so modules
//! of one build all carry the same settings key.

use crate::config::ScanSection;
use modelcache_core::{BuildModel, Error, GradleProject, Project, ProjectSource};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Settings file names, in lookup order
pub const SETTINGS_FILES: [&str; 2] = ["settings.gradle.kts", "settings.gradle"];

/// Build script names
pub const BUILD_FILES: [&str; 2] = ["build.gradle.kts", "build.gradle"];

/// Whether a file name belongs to a build definition
pub fn is_build_definition(file_name: &str) -> bool {
    SETTINGS_FILES.contains(&file_name)
        || BUILD_FILES.contains(&file_name)
        || file_name == "gradle.properties"
}

/// Projects named by the `include` statements of a settings file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludedProjects {
    /// `include` paths, parents included (`:a:b` adds `:a` and `:a:b`)
    pub nested: BTreeSet<String>,
    /// `includeFlat` paths, living next to the build root
    pub flat: BTreeSet<String>,
}

impl IncludedProjects {
    /// Number of distinct project paths
    pub fn len(&self) -> usize {
        self.nested.union(&self.flat).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nested.is_empty() && self.flat.is_empty()
    }

    /// Directories of the included projects
    pub fn dirs(&self, build_root: &Path) -> Vec<PathBuf> {
        let nested = self.nested.iter().map(|path| project_dir(build_root, path));
        let flat = self.flat.iter().map(|path| flat_project_dir(build_root, path));
        nested.chain(flat).collect()
    }
}

/// Parse the project includes of a settings file
///
/// Understands `include 'a', ':b:c'` and `include("a", "b")`, with
/// arguments continued over several lines (blank lines included) after a
/// trailing comma or inside parentheses. Arguments end at `;`, at the
/// closing `)` or at the first token that is not a string. `includeBuild`
/// names another build and is not counted.
pub fn parse_included_projects(settings: &str) -> IncludedProjects {
    let mut projects = IncludedProjects::default();
    let text = strip_comments(settings);
    let mut open: Option<IncludeStatement> = None;

    for line in text.lines() {
        let mut rest = line.trim();

        while !rest.is_empty() {
            let mut statement = match open.take() {
                Some(statement) => statement,
                None => match IncludeStatement::start(rest) {
                    Some((statement, arguments)) => {
                        rest = arguments;
                        statement
                    }
                    None => break,
                },
            };

            match statement.scan(rest, &mut projects) {
                Scan::Continues => {
                    open = Some(statement);
                    break;
                }
                Scan::Ends(after) => rest = after.trim_start().trim_start_matches(';').trim_start(),
            }
        }
    }

    projects
}

/// Remove `//` and `/* */` comments, leaving quoted strings and line breaks
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q || c == '\n' {
                quote = None;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            ('\'' | '"', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

/// Argument list of one `include` statement, possibly spanning lines
struct IncludeStatement {
    flat: bool,
    in_parens: bool,
    expect_argument: bool,
}

enum Scan<'a> {
    /// The arguments go on on the next line
    Continues,
    /// The statement ended; the rest of the line follows
    Ends(&'a str),
}

impl IncludeStatement {
    fn start(line: &str) -> Option<(Self, &str)> {
        let (flat, rest) = match line.strip_prefix("includeFlat") {
            Some(rest) => (true, rest),
            None => (false, line.strip_prefix("include")?),
        };

        // `includeBuild`, `includeModule(...)` and friends are not project includes
        match rest.chars().next() {
            Some(c) if c.is_whitespace() || c == '(' || c == '\'' || c == '"' => {}
            _ => return None,
        }

        let statement = Self {
            flat,
            in_parens: false,
            expect_argument: true,
        };
        Some((statement, rest))
    }

    fn scan<'a>(&mut self, text: &'a str, projects: &mut IncludedProjects) -> Scan<'a> {
        let mut chars = text.char_indices();

        while let Some((idx, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '(' if self.expect_argument && !self.in_parens => self.in_parens = true,
                ')' if self.in_parens => return Scan::Ends(&text[idx + 1..]),
                ',' => self.expect_argument = true,
                ';' => return Scan::Ends(&text[idx + 1..]),
                '\'' | '"' if self.expect_argument => {
                    let value: String = chars
                        .by_ref()
                        .map(|(_, ch)| ch)
                        .take_while(|&ch| ch != c)
                        .collect();
                    self.add(value.trim(), projects);
                    self.expect_argument = false;
                }
                _ => return Scan::Ends(""),
            }
        }

        if self.in_parens || self.expect_argument {
            Scan::Continues
        } else {
            Scan::Ends("")
        }
    }

    fn add(&self, path: &str, projects: &mut IncludedProjects) {
        let segments: Vec<&str> = path.split(':').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return;
        }

        if self.flat {
            projects.flat.insert(format!(":{}", segments.join(":")));
            return;
        }
        for end in 1..=segments.len() {
            projects.nested.insert(format!(":{}", segments[..end].join(":")));
        }
    }
}

/// Directory of a project path relative to the build root (`:a:b` -> `a/b`)
pub fn project_dir(build_root: &Path, project_path: &str) -> PathBuf {
    project_path
        .split(':')
        .filter(|s| !s.is_empty())
        .fold(build_root.to_path_buf(), |dir, segment| dir.join(segment))
}

/// Directory of an `includeFlat` project (`:x` -> `../x`)
pub fn flat_project_dir(build_root: &Path, project_path: &str) -> PathBuf {
    let siblings = build_root.parent().unwrap_or(build_root);
    project_dir(siblings, project_path)
}

/// Directory names never scanned or watched
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    names: Vec<String>,
}

impl SkipRules {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Whether a single directory name is skipped
    pub fn skips_name(&self, name: &OsStr) -> bool {
        name.to_str()
            .is_some_and(|name| self.names.iter().any(|skip| skip == name))
    }

    /// Whether `path` lies below a skipped directory of `root`
    pub fn should_ignore(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        relative
            .components()
            .any(|component| self.skips_name(component.as_os_str()))
    }
}

/// One build found in the workspace
#[derive(Debug, Clone)]
pub struct GradleBuild {
    pub root: PathBuf,
    pub settings_file: PathBuf,
}

impl GradleBuild {
    /// Read the settings file into a build model and the module paths
    pub fn load(&self) -> Result<(BuildModel, IncludedProjects), Error> {
        let text = std::fs::read_to_string(&self.settings_file).map_err(|source| {
            Error::Settings {
                path: self.settings_file.clone(),
                source,
            }
        })?;

        let included = parse_included_projects(&text);
        let count = u32::try_from(included.len() + 1).unwrap_or(u32::MAX);
        Ok((BuildModel::new(self.root.clone(), count), included))
    }
}

/// Project handle backed by a module directory
pub struct FsProject {
    dir: PathBuf,
    model: Result<BuildModel, String>,
}

impl Project for FsProject {
    fn display_name(&self) -> String {
        self.dir.display().to_string()
    }

    fn gradle_project(&self) -> Option<&dyn GradleProject> {
        Some(self)
    }
}

impl GradleProject for FsProject {
    fn was_model_ever_set(&self) -> bool {
        // Every discovered build attempted to load its settings
        true
    }

    fn current_model(&self) -> modelcache_core::Result<BuildModel> {
        self.model
            .clone()
            .map_err(|reason| Error::model_unavailable(self.display_name(), reason))
    }
}

/// Directory tree scanned for builds on every query
pub struct FsWorkspace {
    root: PathBuf,
    max_depth: usize,
    skip: SkipRules,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>, scan: ScanSection) -> Self {
        Self {
            root: root.into(),
            max_depth: scan.max_depth,
            skip: SkipRules::new(scan.skip_dirs),
        }
    }

    /// Find every build below the root, outermost first
    pub fn discover_builds(&self) -> Vec<GradleBuild> {
        let mut builds = Vec::new();

        let walker = WalkDir::new(&self.root)
            .max_depth(self.max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.skip.skips_name(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry during scan: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let dir = entry.path();
            if let Some(settings_file) = SETTINGS_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file())
            {
                builds.push(GradleBuild {
                    root: dir.to_path_buf(),
                    settings_file,
                });
            }
        }

        builds
    }

    /// Open projects of one build
    fn projects_of(build: &GradleBuild) -> Vec<FsProject> {
        match build.load() {
            Ok((model, included)) => {
                let mut projects = vec![FsProject {
                    dir: build.root.clone(),
                    model: Ok(model.clone()),
                }];
                for dir in included.dirs(&build.root) {
                    if dir.is_dir() {
                        projects.push(FsProject {
                            dir,
                            model: Ok(model.clone()),
                        });
                    }
                }
                projects
            }
            Err(e) => {
                warn!("Build at {} has no usable model: {}", build.root.display(), e);
                vec![FsProject {
                    dir: build.root.clone(),
                    model: Err(e.to_string()),
                }]
            }
        }
    }
}

impl ProjectSource for FsWorkspace {
    fn open_projects(&self) -> Vec<Arc<dyn Project>> {
        self.discover_builds()
            .iter()
            .flat_map(Self::projects_of)
            .map(|project| Arc::new(project) as Arc<dyn Project>)
            .collect()
    }
}
