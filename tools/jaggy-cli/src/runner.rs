//! 程序运行函数.

use crate::Cli;
use anyhow::Context;
use jaggy_meter::export::{self, Metric};
use jaggy_meter::prelude::*;

/// 解析命令行参数为计算参数.
fn options(cli: &Cli) -> anyhow::Result<ComputeOptions> {
    Ok(ComputeOptions {
        axis: SweepAxis::new(cli.axis)?,
        selection: cli.regions.parse()?,
        workers: cli.workers.parse()?,
        failure_policy: if cli.skip_failed {
            FailurePolicy::SkipAndRecord
        } else {
            FailurePolicy::FailFast
        },
        keep_ratios: cli.keep_ratios,
    })
}

/// 实际运行.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = options(cli)?;
    // 在读取体积前校验, 避免计算完成后才报错.
    let metric: Metric = cli.metric.parse()?;
    if cli.region_volume.is_some() {
        metric.check_region_level()?;
    }

    let volume = LabeledVolume::open(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    log::info!("loaded volume of shape {:?}", volume.shape());

    let outcome = jaggy_meter::compute(&volume, &options)?;
    if !outcome.dropped.is_empty() {
        log::warn!("requested region(s) not in volume: {:?}", outcome.dropped);
    }
    for f in outcome.failures.iter() {
        log::error!("region {} was skipped: {}", f.id, f.reason);
    }

    let report = &outcome.report;
    report
        .save_json(&cli.output)
        .with_context(|| format!("failed to write report {}", cli.output.display()))?;
    log::info!("report written to {}", cli.output.display());

    if let Some(path) = cli.region_volume.as_ref() {
        let painted = export::paint_regions(&volume, &report.per_region, metric)?;
        export::save_volume(path, &painted, &volume)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = cli.slice_volume.as_ref() {
        let painted = export::paint_slices(&volume, &report.per_slice, options.axis, metric)?;
        export::save_volume(path, &painted, &volume)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::Cli;
    use clap::Parser;
    use jaggy_meter::JaggyError;

    fn parse(args: &[&str]) -> Cli {
        let base = ["jaggy-meter", "-i", "missing.npy", "-o", "missing.json"];
        Cli::try_parse_from(base.iter().chain(args).copied()).unwrap()
    }

    #[test]
    fn test_region_metric_rejected_before_loading() {
        for m in ["min", "max"] {
            let cli = parse(&["--metric", m, "--region-volume", "r.npy"]);
            let err = run(&cli).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<JaggyError>(),
                Some(JaggyError::UnsupportedMetric { .. })
            ));
        }
    }

    #[test]
    fn test_slice_metric_min_passes_validation() {
        // `min` 可用于逐切片回填, 失败只能来自读取不存在的输入.
        let cli = parse(&["--metric", "min", "--slice-volume", "s.npy"]);
        let err = run(&cli).unwrap_err();
        assert!(!matches!(
            err.downcast_ref::<JaggyError>(),
            Some(JaggyError::UnsupportedMetric { .. })
        ));
    }

    #[test]
    fn test_unknown_metric() {
        let err = run(&parse(&["--metric", "avg"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JaggyError>(),
            Some(JaggyError::UnknownMetric(_))
        ));
    }
}
