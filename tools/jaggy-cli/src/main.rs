//! 脑图谱锯齿度命令行工具.

mod runner;

use clap::{ArgAction, Parser, ValueHint};
use std::path::PathBuf;

/// 计算标注体积中各脑区沿扫掠轴的锯齿度, 并输出 JSON 报告.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// 标注体积 (`.nii`, `.nii.gz` 或 `.npy`)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// JSON 报告输出路径
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// 脑区筛选: `ALL`, `LARGEST,N`, `SMALLEST,N` 或以逗号分隔的编号列表
    #[arg(long, default_value = "ALL")]
    pub regions: String,

    /// 扫掠轴 (0, 1 或 2)
    #[arg(long, default_value_t = 0)]
    pub axis: usize,

    /// 工作线程数: `AUTO` 或不小于 1 的整数
    #[arg(long, env = "JAGGY_WORKERS", default_value = "AUTO")]
    pub workers: String,

    /// 导出体积使用的统计量: mean, median, std, min, max
    #[arg(long, default_value = "mean")]
    pub metric: String,

    /// 按脑区回填统计量后的体积输出路径
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub region_volume: Option<PathBuf>,

    /// 按切片回填统计量后的体积输出路径
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub slice_volume: Option<PathBuf>,

    /// 在报告中保留每个脑区的完整差异比序列
    #[arg(long)]
    pub keep_ratios: bool,

    /// 跳过计算失败的脑区而不是中止
    #[arg(long)]
    pub skip_failed: bool,

    /// 日志详细程度, 可重复
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new()
        .with_level(cli.log_level())
        .init()?;
    runner::run(&cli)
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["jaggy-meter", "-i", "a.nii.gz", "-o", "r.json"]).unwrap();
        assert_eq!(cli.regions, "ALL");
        assert_eq!(cli.axis, 0);
        assert_eq!(cli.metric, "mean");
        assert!(!cli.keep_ratios && !cli.skip_failed);
        assert!(cli.region_volume.is_none());
        assert_eq!(cli.log_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "jaggy-meter",
            "-i",
            "a.npy",
            "-o",
            "r.json",
            "--regions",
            "LARGEST,3",
            "--axis",
            "2",
            "--workers",
            "4",
            "--slice-volume",
            "s.npy",
            "--skip-failed",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.regions, "LARGEST,3");
        assert_eq!(cli.axis, 2);
        assert_eq!(cli.workers, "4");
        assert!(cli.skip_failed);
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
    }
}
