//! Reporter output and failure isolation

use memdiag::{
    DType, Device, DiagConfig, FreeCommand, RamSource, RamUsage, Reporter, SystemError,
    TensorRegistry,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn missing_command() -> FreeCommand {
    FreeCommand::new("memdiag-definitely-missing", ["-t", "-m"])
}

#[test]
fn test_missing_command_fails_without_output_and_others_still_work() {
    let registry = TensorRegistry::new();
    let _t = registry.zeros([3, 3], DType::Float32, Device::Cpu).unwrap();

    let mut reporter = Reporter::new(Vec::new())
        .with_config(DiagConfig::command_only(missing_command()))
        .with_registry(registry);

    let err = reporter.report_ram_usage().unwrap_err();
    assert!(matches!(err, SystemError::Io(_)), "{err}");

    let census = reporter.report_census().unwrap();
    assert_eq!(census.total(), 1);

    #[cfg(unix)]
    reporter.report_max_rss().unwrap();

    let text = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(!text.contains("RAM memory"));
    assert!(text.starts_with("('cpu', float32, (3, 3))\t1\n"));
}

#[rstest]
#[case(1000, 250, "RAM memory % used: 25.0")]
#[case(333, 111, "RAM memory % used: 33.33")]
fn test_ram_line_for_known_totals(#[case] total: u64, #[case] used: u64, #[case] line: &str) {
    let usage = RamUsage {
        total_mb: total,
        used_mb: used,
        free_mb: total - used,
        source: RamSource::Command,
    };
    let percent = usage.percent_used().unwrap();
    assert_eq!(memdiag::report::ram_line(percent), line);
}

#[cfg(unix)]
#[test]
fn test_auto_source_always_produces_a_line() {
    let config = DiagConfig {
        ram_source: RamSource::Auto,
        free_command: FreeCommand::new("sh", ["-c", "echo 'Total: 1000 250 750'"]),
        include_ram: true,
    };
    let mut reporter = Reporter::new(Vec::new()).with_config(config);
    let percent = reporter.report_ram_usage().unwrap();
    assert!((0.0..=100.0).contains(&percent));

    let text = String::from_utf8(reporter.into_inner()).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("RAM memory % used: "));
}

#[test]
fn test_malformed_command_output_is_descriptive() {
    let err = RamUsage::parse_free_output("Mem: 10 5\nTotal: lots some none\n").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("memory totals"), "{message}");
    assert!(message.contains("Total: lots some none"), "{message}");
}
