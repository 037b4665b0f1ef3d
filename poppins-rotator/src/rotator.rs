//! The rotation run.
//!
//! A run goes through these steps, each of which can abort it:
//!
//! 1. ensure directories (backend specific)
//! 2. map the archive as it exists now
//! 3. plan: admit, slice and diff every bucket
//! 4. apply the diff, bucket by bucket, removals before additions
//! 5. finalize (backend specific)
//!
//! Nothing is rolled back when a step fails. The next run maps the archive
//! again and plans from whatever is on disk.
//!
//! Runs against the same archive must be serialized by the caller; the
//! rotator takes no locks.

use poppins_clock::Dirstamp;
use poppins_fs::{CommandRunner, Filesystem};

use crate::backend::{create_backend, Backend, BackendContext, BackendKind};
use crate::config::RotatorConfig;
use crate::error::RotateError;
use crate::logger::Logger;
use crate::mapper::{ArchiveMapper, ArchiveScan};
use crate::plan::{plan, ActionKind, Plan};
use crate::report::Report;

/// Rotates the archive of one host.
pub struct Rotator<'a> {
    config: &'a RotatorConfig,
    fs: &'a dyn Filesystem,
    logger: &'a dyn Logger,
    backend: Box<dyn Backend + 'a>,
}

impl<'a> Rotator<'a> {
    /// Validate `config` and set up its backend.
    pub fn new(
        config: &'a RotatorConfig,
        fs: &'a dyn Filesystem,
        runner: &'a dyn CommandRunner,
        logger: &'a dyn Logger,
    ) -> Result<Self, RotateError> {
        let backend = create_backend(config, BackendContext { fs, runner, logger });
        Self::with_backend(config, fs, logger, backend)
    }

    /// Use an already constructed backend.
    pub fn with_backend(
        config: &'a RotatorConfig,
        fs: &'a dyn Filesystem,
        logger: &'a dyn Logger,
        backend: Box<dyn Backend + 'a>,
    ) -> Result<Self, RotateError> {
        config.validate()?;
        Ok(Self {
            config,
            fs,
            logger,
            backend,
        })
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Rotate the archive at `now`.
    pub fn run(&mut self, now: Dirstamp) -> Result<Report, RotateError> {
        self.backend.ensure_directories(&self.config.policy)?;
        let scan = self.map()?;
        let plan = self.plan(&scan, now)?;
        self.apply(&plan)?;
        self.backend.finalize()?;

        let report = Report::from_plan(&plan, self.backend.kind(), false, scan.unclean);
        self.logger.notice(&report.summary());
        Ok(report)
    }

    /// Plan a rotation at `now` without touching the archive.
    pub fn dry_run(&mut self, now: Dirstamp) -> Result<Report, RotateError> {
        let scan = self.map()?;
        let plan = self.plan(&scan, now)?;
        Ok(Report::from_plan(&plan, self.backend.kind(), true, scan.unclean))
    }

    /// The archive as it currently is.
    pub fn survey(&mut self) -> Result<Report, RotateError> {
        let scan = self.map()?;
        Ok(Report::from_scan(&scan, &self.config.policy, self.backend.kind()))
    }

    fn map(&mut self) -> Result<ArchiveScan, RotateError> {
        let layout = self.backend.layout()?;
        self.logger.debug(&format!("mapping {:?}", layout));

        let mapper = ArchiveMapper::new(self.fs, layout, &self.config.hostdir_name)?;
        let scan = mapper.scan(&self.config.policy)?;

        for entry in &scan.unclean {
            self.logger.warn(&format!(
                "unclean archive entry {} ({}); remove it or prefix its name with `_`",
                entry.path.display(),
                entry.kind
            ));
        }
        for (bucket, names) in &scan.state {
            self.logger.debug(&format!("{}: {} snapshot(s)", bucket, names.len()));
        }
        Ok(scan)
    }

    fn plan(&self, scan: &ArchiveScan, now: Dirstamp) -> Result<Plan, RotateError> {
        plan(&scan.state, &self.config.policy, now, &self.config.hostdir_name)
    }

    /// Apply every action in order, stopping at the first failure.
    fn apply(&self, plan: &Plan) -> Result<(), RotateError> {
        for action in plan.actions() {
            match action.kind {
                ActionKind::Remove => self.backend.remove(&action.bucket, &action.name)?,
                ActionKind::Add => self.backend.add(&action.bucket, &action.name)?,
            }
            self.logger.verbose(&format!("{} {} in {}", action.kind, action.name, action.bucket));
        }
        Ok(())
    }
}
