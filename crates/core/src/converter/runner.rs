//! Runs a [`Conversion`] against a staged input.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::invoker::{
    describe_exit, InvocationContext, Tool, ToolCatalog, ToolCommand, ToolRunner,
};

use super::chdman::{self, ChdExtract};
use super::config::ConverterConfig;
use super::error::ConversionError;
use super::options::{ChdCreateOptions, ChdMedia};
use super::types::{Artifact, ArtifactRole, Conversion, ConversionOutcome};
use super::verify::{find_secondaries, verify_directory, verify_file};
use super::{dolphin, maxcso, sevenzip};

/// Subdirectory of the staging area that routines write their outputs to.
pub const OUTPUT_DIR: &str = "output";

/// What to do when a step exits unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FailurePolicy {
    Abort,
    /// Record a warning and keep going.
    Warn,
    /// Keep going only if this file was written anyway.
    WarnIfExists(PathBuf),
}

#[derive(Debug)]
struct Step {
    label: String,
    command: ToolCommand,
    on_failure: FailurePolicy,
}

impl Step {
    fn new(label: impl Into<String>, command: ToolCommand) -> Self {
        Self {
            label: label.into(),
            command,
            on_failure: FailurePolicy::Abort,
        }
    }

    fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}

/// Executes conversion routines through a [`ToolRunner`].
pub struct ConversionRunner {
    config: ConverterConfig,
    catalog: ToolCatalog,
    runner: Arc<dyn ToolRunner>,
}

impl ConversionRunner {
    pub fn new(config: ConverterConfig, catalog: ToolCatalog, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            config,
            catalog,
            runner,
        }
    }

    /// Runs every tool step for `conversion`, then verifies the declared
    /// artifacts.
    ///
    /// Outputs are written to `<staging_dir>/output/` and named after
    /// `base_name`. The first failing step ends the routine with its captured
    /// output. An artifact that is missing or empty after a clean exit is a
    /// failure too.
    pub async fn convert(
        &self,
        conversion: &Conversion,
        primary: &Path,
        staging_dir: &Path,
        base_name: &str,
        ctx: &InvocationContext,
    ) -> Result<ConversionOutcome, ConversionError> {
        let start = Instant::now();
        if tokio::fs::metadata(primary).await.is_err() {
            return Err(ConversionError::InputNotFound {
                path: primary.to_path_buf(),
            });
        }

        let output_dir = staging_dir.join(OUTPUT_DIR);
        tokio::fs::create_dir_all(&output_dir).await?;

        info!("Converting {} ({})", primary.display(), conversion);
        let steps = self.plan(conversion, primary, &output_dir, base_name);

        let mut warnings = Vec::new();
        let mut last_output = String::new();
        for step in steps {
            debug!("Running {}: {}", step.label, step.command);
            let result = self.runner.run(step.command, ctx).await?;
            if !result.success() {
                match step.on_failure {
                    FailurePolicy::Abort => {
                        warn!("{} failed ({})", step.label, describe_exit(&result.exit_code));
                        return Err(ConversionError::tool_failed(
                            step.label,
                            result.exit_code,
                            result.output,
                        ));
                    }
                    FailurePolicy::Warn => {
                        let message = format!(
                            "{} failed ({})",
                            step.label,
                            describe_exit(&result.exit_code)
                        );
                        warn!("{}", message);
                        warnings.push(message);
                    }
                    FailurePolicy::WarnIfExists(ref path) => {
                        if tokio::fs::metadata(path).await.is_err() {
                            return Err(ConversionError::tool_failed(
                                step.label,
                                result.exit_code,
                                result.output,
                            ));
                        }
                        let message = format!(
                            "{} failed ({}) but wrote {}",
                            step.label,
                            describe_exit(&result.exit_code),
                            path.display()
                        );
                        warn!("{}", message);
                        warnings.push(message);
                    }
                }
            }
            last_output = result.output;
        }

        let mut outcome = ConversionOutcome {
            warnings,
            ..ConversionOutcome::default()
        };

        if conversion.is_text_only() {
            outcome.report = Some(last_output);
        } else if conversion.produces_directory() {
            let dest = output_dir.join(base_name);
            tokio::fs::rename(primary, &dest).await?;
            let entries = verify_directory(&dest).await?;
            outcome.artifacts.push(Artifact {
                path: dest,
                role: ArtifactRole::Primary,
                size_bytes: entries,
                is_dir: true,
            });
        } else {
            outcome.artifacts = collect_artifacts(conversion, &output_dir, base_name).await?;
        }

        outcome.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Conversion finished in {} ms with {} artifact(s)",
            outcome.duration_ms,
            outcome.artifacts.len()
        );
        Ok(outcome)
    }

    fn plan(
        &self,
        conversion: &Conversion,
        primary: &Path,
        output_dir: &Path,
        base_name: &str,
    ) -> Vec<Step> {
        let chdman_path = self.catalog.path(Tool::Chdman);
        let output = |ext: &str| output_dir.join(format!("{}.{}", base_name, ext));

        match conversion {
            Conversion::CompressCd(opts) => {
                vec![self.create_step(ChdMedia::Cd, primary, &output("chd"), opts)]
            }
            Conversion::CompressDvd(opts) => {
                vec![self.create_step(ChdMedia::Dvd, primary, &output("chd"), opts)]
            }
            Conversion::CompressRaw(opts) => {
                vec![self.create_step(ChdMedia::Raw, primary, &output("chd"), opts)]
            }
            Conversion::CompressHardDisk { chd, disk } => {
                let step = self.create_step(ChdMedia::HardDisk, primary, &output("chd"), chd);
                let command = chdman::with_hard_disk(step.command, disk);
                vec![Step::new(step.label, command)]
            }
            Conversion::CompressLaserDisc { chd, frames } => {
                let step = self.create_step(ChdMedia::LaserDisc, primary, &output("chd"), chd);
                let command = chdman::with_laserdisc(step.command, frames);
                vec![Step::new(step.label, command)]
            }
            Conversion::CompressGameCube(opts) => {
                let command = dolphin::compress(
                    self.catalog.path(Tool::DolphinTool),
                    primary,
                    &output(opts.format.extension()),
                    opts,
                );
                vec![Step::new("dolphintool convert", command)]
            }
            Conversion::CompressCso => {
                let target = output("cso");
                let command = maxcso::compress(self.catalog.path(Tool::Maxcso), primary, &target);
                vec![Step::new("maxcso", command).on_failure(FailurePolicy::WarnIfExists(target))]
            }
            Conversion::ExtractCd { format } => {
                self.extract_steps(ChdExtract::Cd, primary, &output(format.extension()))
            }
            Conversion::ExtractDvd => self.extract_steps(ChdExtract::Dvd, primary, &output("iso")),
            Conversion::ExtractHardDisk { format } | Conversion::ExtractRaw { format } => {
                self.extract_steps(ChdExtract::HardDisk, primary, &output(format.extension()))
            }
            Conversion::ExtractLaserDisc => {
                self.extract_steps(ChdExtract::LaserDisc, primary, &output("raw"))
            }
            Conversion::ExtractGameCube => {
                let command =
                    dolphin::decompress(self.catalog.path(Tool::DolphinTool), primary, &output("iso"));
                vec![Step::new("dolphintool convert", command)]
            }
            Conversion::RepackArchive => {
                let sevenzip_path = self.catalog.path(Tool::SevenZip);
                let archive = output("7z");
                let mut steps = vec![Step::new(
                    "7z add",
                    sevenzip::pack(sevenzip_path, primary, &archive),
                )];
                if self.config.validate_after_repack {
                    steps.push(Step::new("7z test", sevenzip::test(sevenzip_path, &archive)));
                }
                steps
            }
            // Staging already extracted the tree.
            Conversion::ExtractArchive => Vec::new(),
            Conversion::ChdInfo => vec![Step::new("chdman info", chdman::info(chdman_path, primary))],
            Conversion::ChdVerify { fix } => {
                vec![Step::new("chdman verify", chdman::verify(chdman_path, primary, *fix))]
            }
        }
    }

    fn create_step(
        &self,
        media: ChdMedia,
        primary: &Path,
        target: &Path,
        options: &ChdCreateOptions,
    ) -> Step {
        let command = chdman::create(
            self.catalog.path(Tool::Chdman),
            media,
            primary,
            target,
            options,
            &self.config,
        );
        Step::new(chdman_label(&command), command)
    }

    fn extract_steps(&self, kind: ChdExtract, primary: &Path, target: &Path) -> Vec<Step> {
        let chdman_path = self.catalog.path(Tool::Chdman);
        let mut steps = Vec::new();
        if self.config.verify_before_extract {
            steps.push(
                Step::new(
                    "chdman verify",
                    chdman::verify(chdman_path, primary, self.config.verify_fix),
                )
                .on_failure(FailurePolicy::Warn),
            );
        }
        let command = chdman::extract(chdman_path, kind, primary, target, &self.config);
        steps.push(Step::new(chdman_label(&command), command));
        steps
    }
}

/// `chdman <subcommand>` for diagnostics.
fn chdman_label(command: &ToolCommand) -> String {
    let sub = command
        .arg_list()
        .first()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("chdman {}", sub)
}

async fn collect_artifacts(
    conversion: &Conversion,
    output_dir: &Path,
    base_name: &str,
) -> Result<Vec<Artifact>, ConversionError> {
    let mut artifacts = Vec::new();
    let Some(ext) = conversion.primary_extension() else {
        return Ok(artifacts);
    };

    let primary = output_dir.join(format!("{}.{}", base_name, ext));
    let size = verify_file(&primary).await?;
    artifacts.push(Artifact {
        path: primary,
        role: ArtifactRole::Primary,
        size_bytes: size,
        is_dir: false,
    });

    let extensions = conversion.secondary_extensions();
    if extensions.is_empty() {
        return Ok(artifacts);
    }
    let secondaries = find_secondaries(output_dir, base_name, extensions).await?;
    if secondaries.is_empty() {
        return Err(ConversionError::SecondaryMissing {
            base: base_name.to_string(),
            extensions: extensions.join("/"),
        });
    }
    for path in secondaries {
        let size = verify_file(&path).await?;
        artifacts.push(Artifact {
            path,
            role: ArtifactRole::Secondary,
            size_bytes: size,
            is_dir: false,
        });
    }
    Ok(artifacts)
}
