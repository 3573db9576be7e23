use clap::ValueEnum;
use vimctl_remote::ReadinessStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
/// Readiness detection strategy accepted on the command line.
pub enum CliReadinessStrategy {
    InlineStream,
    WatchedFile,
}

impl From<CliReadinessStrategy> for ReadinessStrategy {
    fn from(value: CliReadinessStrategy) -> Self {
        match value {
            CliReadinessStrategy::InlineStream => ReadinessStrategy::InlineStream,
            CliReadinessStrategy::WatchedFile => ReadinessStrategy::WatchedFile,
        }
    }
}
