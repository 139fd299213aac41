//! Batch organizer - drives matcher, resolver and executor over a file list
//!
//! Failure policy: a batch stops at the first file that fails (an unresolved
//! collision under `fail`, or any executor error) and returns that error.
//! Files moved earlier in the same call stay moved; there is no rollback.
//!
//! Ordering: files are handled one at a time in input order, so the rename
//! check for a file sees every move made earlier in the same batch. A
//! per-call `BatchPlan` tracks those moves so that a dry run reaches the same
//! decisions as the live run would.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::collision::{self, Resolution};
use super::executor::{self, MoveOperation};
use super::matcher::{self, Rule};
use super::{BatchAborted, OrganizeError, OrganizeResult, Organizer};
use crate::config::{Config, Settings};

/// The production organizer
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    config: Config,
    dry_run_override: Option<bool>,
}

impl FileOrganizer {
    /// Create an organizer over an already validated configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dry_run_override: None,
        }
    }

    /// Effective settings for the next call
    pub fn settings(&self) -> Settings {
        let mut settings = self.config.settings;
        if let Some(dry_run) = self.dry_run_override {
            settings.dry_run = dry_run;
        }
        settings
    }

    /// Desired destination for `source` according to the rules.
    ///
    /// A file already sitting in its rule's directory maps onto itself.
    fn planned_destination(&self, source: &Path) -> Option<PathBuf> {
        let file_name = source.file_name()?.to_str()?;
        let rule = matcher::match_rule(file_name, &self.config.organize.patterns)?;
        debug!("Rule {:?} matched {}", rule.glob, source.display());
        if already_filed(&self.config, &rule.destination, source) {
            return Some(source.to_path_buf());
        }
        let dir = destination_dir(&self.config, &rule.destination, parent_of(source));
        Some(dir.join(file_name))
    }

    /// Resolve collisions and execute one move.
    fn move_one(
        &self,
        source: &Path,
        desired: PathBuf,
        settings: &Settings,
        plan: &mut BatchPlan,
    ) -> Result<OrganizeResult, OrganizeError> {
        executor::check_source(source)?;

        if desired == source {
            debug!("Already in place: {}", source.display());
            return Ok(OrganizeResult::left_in_place(
                source,
                desired,
                settings.dry_run,
            ));
        }

        let resolution = collision::resolve(&desired, settings.collision, |p| plan.is_taken(p))
            .map_err(|e| e.for_source(source))?;
        let actual = match resolution {
            Resolution::Proceed(path) => path,
            Resolution::Skip => {
                warn!(
                    "Skipping {}: {} already exists",
                    source.display(),
                    desired.display()
                );
                return Ok(OrganizeResult::left_in_place(
                    source,
                    desired,
                    settings.dry_run,
                ));
            }
        };

        let op = MoveOperation {
            source: source.to_path_buf(),
            desired_destination: desired,
            actual_destination: actual,
        };
        if op.was_renamed() {
            info!(
                "Renamed to avoid collision: {}",
                op.actual_destination.display()
            );
        }

        executor::execute_with(&op, settings, |p| plan.is_taken(p))?;
        plan.record(&op);

        Ok(OrganizeResult::moved(
            source,
            op.actual_destination,
            settings.dry_run,
        ))
    }

    /// Shared loop behind every batch entry point.
    ///
    /// `desired` maps a source to its destination, or `None` to leave it alone.
    /// Unclaimed files are reported without touching them, even when unreadable.
    fn run_batch(
        &self,
        paths: &[PathBuf],
        desired: impl Fn(&Path) -> Option<PathBuf>,
    ) -> Result<Vec<OrganizeResult>, BatchAborted> {
        let settings = self.settings();
        let mut plan = BatchPlan::default();
        let mut results = Vec::with_capacity(paths.len());

        for source in paths {
            let source = source.as_path();
            let target = desired(source);

            let outcome = match &target {
                Some(dest) => self.move_one(source, dest.clone(), &settings, &mut plan),
                None => Ok(OrganizeResult::unmatched(source, settings.dry_run)),
            };

            match outcome {
                Ok(result) => results.push(result),
                Err(error) => {
                    warn!(
                        "Batch aborted at {} after {} file(s): {}",
                        source.display(),
                        results.len(),
                        error
                    );
                    results.push(OrganizeResult::failed(
                        source,
                        target,
                        &error,
                        settings.dry_run,
                    ));
                    return Err(BatchAborted {
                        completed: results,
                        error,
                    });
                }
            }
        }

        let moved = results.iter().filter(|r| r.moved).count();
        info!(
            "{}Organized {} of {} file(s)",
            if settings.dry_run { "[dry-run] " } else { "" },
            moved,
            results.len()
        );
        Ok(results)
    }
}

/// Paths claimed and freed by earlier moves of the same call.
///
/// Both modes consult it, so a dry run sees the filesystem a live run would:
/// destinations already written count as taken, sources already moved away
/// count as free.
#[derive(Debug, Default)]
struct BatchPlan {
    claimed: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

impl BatchPlan {
    fn is_taken(&self, path: &Path) -> bool {
        self.claimed.contains(path) || (!self.vacated.contains(path) && path.exists())
    }

    fn record(&mut self, op: &MoveOperation) {
        self.vacated.insert(op.source.clone());
        self.vacated.remove(&op.actual_destination);
        self.claimed.remove(&op.source);
        self.claimed.insert(op.actual_destination.clone());
    }
}

impl Organizer for FileOrganizer {
    fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run_override = Some(dry_run);
    }

    fn is_dry_run(&self) -> bool {
        self.settings().dry_run
    }

    fn add_pattern(&mut self, rule: Rule) {
        self.config.organize.patterns.push(rule);
    }

    fn organize_file(&mut self, path: &Path) -> Result<OrganizeResult, OrganizeError> {
        let settings = self.settings();
        match self.planned_destination(path) {
            Some(dest) => self.move_one(path, dest, &settings, &mut BatchPlan::default()),
            None => Ok(OrganizeResult::unmatched(path, settings.dry_run)),
        }
    }

    fn move_file(
        &mut self,
        source: &Path,
        destination: &Path,
    ) -> Result<OrganizeResult, OrganizeError> {
        let settings = self.settings();
        let destination = normalize(&crate::expand_path(destination));
        self.move_one(source, destination, &settings, &mut BatchPlan::default())
    }

    fn organize_files(
        &mut self,
        paths: &[PathBuf],
        dest_dir: &Path,
    ) -> Result<Vec<OrganizeResult>, BatchAborted> {
        let dest_dir = crate::expand_path(dest_dir);
        self.run_batch(paths, |source| {
            source.file_name().map(|name| dest_dir.join(name))
        })
    }

    fn organize_by_patterns(
        &mut self,
        paths: &[PathBuf],
    ) -> Result<Vec<OrganizeResult>, BatchAborted> {
        self.run_batch(paths, |source| self.planned_destination(source))
    }

    fn organize_dir(&mut self, dir: &Path) -> Result<Vec<OrganizeResult>, BatchAborted> {
        let dir = crate::expand_path(dir);
        if !dir.is_dir() {
            return Err(BatchAborted {
                completed: Vec::new(),
                error: OrganizeError::NotADirectory(dir),
            });
        }

        let skip = destination_dirs(&self.config, &dir);
        let mut files = Vec::new();
        collect_files(&dir, self.config.organize.recursive, &skip, &mut files).map_err(
            |e| BatchAborted {
                completed: Vec::new(),
                error: OrganizeError::io("read directory", &dir, e),
            },
        )?;

        debug!("Found {} file(s) in {}", files.len(), dir.display());
        self.organize_by_patterns(&files)
    }

    fn preview(&self, path: &Path) -> Option<PathBuf> {
        self.planned_destination(path)
    }
}

/// Resolve a rule destination for a file living in `source_dir`.
///
/// Relative destinations hang off `organize.target_dir` when set, otherwise
/// off the file's own directory.
pub fn destination_dir(config: &Config, rule_dest: &Path, source_dir: &Path) -> PathBuf {
    let dest = crate::expand_path(rule_dest);
    if dest.is_absolute() {
        return normalize(&dest);
    }
    match &config.organize.target_dir {
        Some(root) => normalize(&crate::expand_path(root).join(dest)),
        None => normalize(&source_dir.join(dest)),
    }
}

/// Whether `source` already lives where `rule_dest` would send it.
///
/// Relative destinations without a `target_dir` hang off the file's own
/// directory, so a file filed on an earlier pass sits in a directory ending
/// with the destination; sending it again would nest it one level deeper.
fn already_filed(config: &Config, rule_dest: &Path, source: &Path) -> bool {
    let parent = parent_of(source);
    if same_dir(parent, &destination_dir(config, rule_dest, parent)) {
        return true;
    }

    let dest = normalize(&crate::expand_path(rule_dest));
    config.organize.target_dir.is_none()
        && dest.components().next().is_some()
        && dest
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        && normalize(parent).ends_with(&dest)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if normalize(a) == normalize(b) {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Lexically drop `.` components and fold `..` into its parent
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Canonical directories every rule sends files from `root` into
pub fn destination_dirs(config: &Config, root: &Path) -> HashSet<PathBuf> {
    config
        .organize
        .patterns
        .iter()
        .map(|rule| destination_dir(config, &rule.destination, root))
        .map(|dir| std::fs::canonicalize(&dir).unwrap_or(dir))
        .collect()
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Regular files of `dir`, sorted by name, skipping symlinks and rule destinations
fn collect_files(
    dir: &Path,
    recursive: bool,
    skip: &HashSet<PathBuf>,
    out: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let ft = entry.file_type()?;
        if ft.is_symlink() {
            continue;
        }
        let path = entry.path();
        if ft.is_dir() {
            let canonical = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if recursive && !skip.contains(&canonical) {
                collect_files(&path, recursive, skip, out)?;
            }
        } else if ft.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::CollisionPolicy;
    use std::fs;

    fn organizer(root: &Path, policy: CollisionPolicy) -> FileOrganizer {
        let mut config = Config::default();
        config.settings.collision = policy;
        config.organize.target_dir = Some(root.to_path_buf());
        config.organize.patterns = vec![
            Rule::new("*.txt", "documents/"),
            Rule::new("*.jpg", "images/"),
        ];
        FileOrganizer::new(config)
    }

    #[test]
    fn test_rename_sees_earlier_moves_in_same_batch() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("one").join("a.txt");
        let b = dir.path().join("two").join("a.txt");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, "first").unwrap();
        fs::write(&b, "second").unwrap();

        let mut org = organizer(dir.path(), CollisionPolicy::Rename);
        let results = org.organize_by_patterns(&[a.clone(), b.clone()]).unwrap();

        let docs = dir.path().join("documents");
        assert_eq!(results[0].destination_path, Some(docs.join("a.txt")));
        assert_eq!(results[1].destination_path, Some(docs.join("a (1).txt")));
        assert_eq!(fs::read_to_string(docs.join("a.txt")).unwrap(), "first");
        assert_eq!(fs::read_to_string(docs.join("a (1).txt")).unwrap(), "second");
    }

    #[test]
    fn test_dry_run_plans_like_live_run() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("one").join("a.txt");
        let b = dir.path().join("two").join("a.txt");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, "first").unwrap();
        fs::write(&b, "second").unwrap();
        let inputs = vec![a.clone(), b.clone()];

        let mut org = organizer(dir.path(), CollisionPolicy::Rename);
        org.set_dry_run(true);
        let preview = org.organize_by_patterns(&inputs).unwrap();
        assert!(a.exists() && b.exists());
        assert!(!dir.path().join("documents").exists());
        assert!(preview.iter().all(|r| r.dry_run && r.moved));

        org.set_dry_run(false);
        let live = org.organize_by_patterns(&inputs).unwrap();

        let planned: Vec<_> = preview.iter().map(|r| &r.destination_path).collect();
        let actual: Vec<_> = live.iter().map(|r| &r.destination_path).collect();
        assert_eq!(planned, actual);
    }

    #[test]
    fn test_abort_keeps_earlier_moves() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("documents");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("b.txt"), "existing").unwrap();

        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        let c = dir.path().join("c.txt");
        for p in [&a, &b, &c] {
            fs::write(p, "x").unwrap();
        }

        let mut org = organizer(dir.path(), CollisionPolicy::Fail);
        let aborted = org
            .organize_by_patterns(&[a.clone(), b.clone(), c.clone()])
            .unwrap_err();

        assert!(aborted.error.to_string().contains("already exists"));
        assert_eq!(aborted.completed.len(), 2);
        assert_eq!(aborted.moved_count(), 1);
        assert!(aborted.completed[1].error.is_some());
        assert!(!a.exists());
        assert!(docs.join("a.txt").exists());
        assert!(b.exists());
        assert!(c.exists());
        assert_eq!(fs::read_to_string(docs.join("b.txt")).unwrap(), "existing");
    }

    #[test]
    fn test_skip_policy_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("documents");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.txt"), "existing").unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "new").unwrap();

        let mut org = organizer(dir.path(), CollisionPolicy::Skip);
        let results = org.organize_by_patterns(&[a.clone()]).unwrap();

        assert!(!results[0].moved);
        assert!(results[0].error.is_none());
        assert_eq!(results[0].status(), "skipped");
        assert!(a.exists());
    }

    #[test]
    fn test_organize_files_bypasses_rules() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.txt");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();
        let picked = dir.path().join("picked");

        let mut org = organizer(dir.path(), CollisionPolicy::Rename);
        let results = org.organize_files(&[a, b], &picked).unwrap();

        assert!(results.iter().all(|r| r.moved));
        assert!(picked.join("a.bin").exists());
        assert!(picked.join("b.txt").exists());
    }

    #[test]
    fn test_organize_file_and_move_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let z = dir.path().join("z.bin");
        fs::write(&a, "img").unwrap();
        fs::write(&z, "bin").unwrap();

        let mut org = organizer(dir.path(), CollisionPolicy::Rename);
        let result = org.organize_file(&a).unwrap();
        assert_eq!(
            result.destination_path,
            Some(dir.path().join("images").join("a.jpg"))
        );

        let result = org.organize_file(&z).unwrap();
        assert!(!result.moved);
        assert!(z.exists());

        let target = dir.path().join("misc").join("renamed.bin");
        let result = org.move_file(&z, &target).unwrap();
        assert!(result.moved);
        assert!(target.exists());

        let err = org.organize_file(&dir.path().join("gone.txt")).unwrap_err();
        assert!(matches!(err, OrganizeError::SourceNotFound(_)));
    }

    #[test]
    fn test_relative_destination_without_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "x").unwrap();

        let mut config = Config::default();
        config.organize.patterns = vec![Rule::new("*.txt", "documents")];
        let org = FileOrganizer::new(config);

        assert_eq!(
            org.preview(&a),
            Some(dir.path().join("documents").join("a.txt"))
        );
    }

    #[test]
    fn test_add_pattern_appends_lowest_priority() {
        let mut org = organizer(Path::new("/sorted"), CollisionPolicy::Rename);
        org.add_pattern(Rule::new("*", "misc/"));

        assert_eq!(
            org.preview(Path::new("/in/a.txt")),
            Some(PathBuf::from("/sorted/documents/a.txt"))
        );
        assert_eq!(
            org.preview(Path::new("/in/a.bin")),
            Some(PathBuf::from("/sorted/misc/a.bin"))
        );
    }

    #[test]
    fn test_organize_dir_recursive_skips_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("documents")).unwrap();
        fs::create_dir_all(root.join("inbox")).unwrap();
        fs::write(root.join("documents").join("old.txt"), "old").unwrap();
        fs::write(root.join("inbox").join("new.txt"), "new").unwrap();
        fs::write(root.join("top.jpg"), "img").unwrap();

        let mut org = organizer(root, CollisionPolicy::Rename);
        let mut config = org.config().clone();
        config.organize.recursive = true;
        org.set_config(config);

        let results = org.organize_dir(root).unwrap();

        assert_eq!(results.len(), 2);
        assert!(root.join("documents").join("new.txt").exists());
        assert!(root.join("documents").join("old.txt").exists());
        assert!(root.join("images").join("top.jpg").exists());
    }

    #[test]
    fn test_organize_dir_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("f");
        fs::write(&f, "").unwrap();

        let mut org = organizer(dir.path(), CollisionPolicy::Rename);
        let aborted = org.organize_dir(&f).unwrap_err();
        assert!(matches!(aborted.error, OrganizeError::NotADirectory(_)));
    }
}
