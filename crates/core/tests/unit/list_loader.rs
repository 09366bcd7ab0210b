//! # List Loader Tests
//!
//! Covers the positional contract of `update_from_list`: the mandatory prefix, the
//! conditionally required trailing entries, and the warn-then-fail behavior of short
//! lists.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sasim_core::config::{BandwidthMode, ConfListValue, ConfRecord, Dataflow, ScaleConfig};
use sasim_core::memory::MapMode;
use sasim_core::ConfigError;

use tracing::Level;

use crate::common::{capture_logs, init_tracing, lines_at};

/// The eleven mandatory entries.
fn prefix(dataflow: &str, mode: &str) -> Vec<ConfListValue> {
    vec![
        "run1".into(),
        16.into(),
        16.into(),
        256.into(),
        256.into(),
        128.into(),
        0.into(),
        10_000_000.into(),
        20_000_000.into(),
        dataflow.into(),
        mode.into(),
    ]
}

fn bank_maps(count: usize) -> ConfListValue {
    (0..count)
        .map(|bank| format!("maps/bank{bank}.csv"))
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn test_calc_prefix_only() {
    init_tracing();
    let config = ScaleConfig::from_list(&prefix("os", "CALC")).unwrap();

    assert_eq!(config.get_run_name(), Some("run1"));
    assert_eq!(config.get_array_dims(), Some((16, 16)));
    assert_eq!(config.get_mem_sizes(), Some((256, 256, 128)));
    assert_eq!(config.get_offsets(), Some((0, 10_000_000, 20_000_000)));
    assert_eq!(config.get_dataflow(), Some(&Dataflow::OutputStationary));
    assert_eq!(config.get_bandwidth_mode(), Some(BandwidthMode::Calc));
    assert_eq!(config.get_memory_banks(), Some(1));
}

#[test]
fn test_text_scalars_are_parsed() {
    let list: Vec<ConfListValue> = [
        "run2", "8", "4", "32", "16", "8", "100", "200", "300", "is", "CALC",
    ]
    .into_iter()
    .map(ConfListValue::from)
    .collect();

    let config = ScaleConfig::from_list(&list).unwrap();
    assert_eq!(config.get_array_dims(), Some((8, 4)));
    assert_eq!(config.get_offsets(), Some((100, 200, 300)));
    assert_eq!(config.get_dataflow(), Some(&Dataflow::InputStationary));
}

#[test]
fn test_user_mode_without_bandwidths_warns_then_fails() {
    init_tracing();
    let list = prefix("os", "USER");
    assert_eq!(list.len(), 11);

    let mut config = ScaleConfig::new();
    let err = config.update_from_list(&list).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::BandwidthCountMismatch {
            banks: 1,
            bandwidths: 0
        }
    ));
    assert!(!config.is_valid());
}

#[test]
fn test_eleven_entry_list_logs_length_warning_before_failing() {
    let (result, logs) = capture_logs(|| ScaleConfig::from_list(&prefix("os", "USER")));

    assert!(matches!(
        result,
        Err(ConfigError::BandwidthCountMismatch { .. })
    ));
    let warnings = lines_at(&logs, Level::WARN);
    assert_eq!(warnings.len(), 1, "logs:\n{logs}");
    assert!(warnings[0].contains("incompatible number of elements"));
    assert!(warnings[0].contains("len=11"));
}

#[test]
fn test_twelve_entry_list_logs_no_length_warning() {
    let mut list = prefix("ws", "USER");
    list.push(vec![64_u64].into());

    let (result, logs) = capture_logs(|| ScaleConfig::from_list(&list));
    assert!(result.is_ok());
    assert!(lines_at(&logs, Level::WARN).is_empty(), "logs:\n{logs}");
}

#[test]
fn test_user_mode_single_bank() {
    let mut list = prefix("ws", "USER");
    list.push(vec![64_u64].into());

    let config = ScaleConfig::from_list(&list).unwrap();
    assert_eq!(config.use_user_dram_bandwidth(), Some(true));
    assert_eq!(config.get_bandwidths_as_list(), Some(&[64][..]));
    assert_eq!(config.get_memory_banks(), Some(1));
}

#[test]
fn test_user_mode_bandwidth_count_checked_against_banks() {
    let mut list = prefix("ws", "USER");
    list.push(vec![10_u64, 20].into());
    list.push(3.into());
    list.push(bank_maps(3));

    let err = ScaleConfig::from_list(&list).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::BandwidthCountMismatch {
            banks: 3,
            bandwidths: 2
        }
    ));
}

#[test]
fn test_bandwidths_as_comma_text() {
    let mut list = prefix("ws", "USER");
    list.push("10, 20".into());
    list.push(2.into());
    list.push(bank_maps(2));

    let config = ScaleConfig::from_list(&list).unwrap();
    assert_eq!(config.get_bandwidths_as_list(), Some(&[10, 20][..]));
}

#[rstest]
#[case("calc")]
#[case("User")]
#[case("BOTH")]
fn test_invalid_mode_token_is_fatal(#[case] token: &str) {
    let err = ScaleConfig::from_list(&prefix("os", token)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBandwidthMode(_)));
}

#[test]
fn test_list_shorter_than_eleven_is_fatal() {
    let mut list = prefix("os", "CALC");
    let _ = list.pop();
    let err = ScaleConfig::from_list(&list).unwrap_err();
    assert!(matches!(err, ConfigError::ListTooShort { len: 10 }));
}

#[test]
fn test_multi_bank_requires_memory_maps() {
    let mut list = prefix("ws", "CALC");
    list.push("ignored in CALC mode".into());
    list.push(2.into());

    let err = ScaleConfig::from_list(&list).unwrap_err();
    assert!(matches!(err, ConfigError::MissingMemoryMaps { banks: 2 }));
}

#[test]
fn test_multi_bank_map_count_must_match() {
    let mut list = prefix("ws", "CALC");
    list.push("ignored".into());
    list.push(4.into());
    list.push(bank_maps(3));

    let err = ScaleConfig::from_list(&list).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MemoryMapCountMismatch { banks: 4, maps: 3 }
    ));
}

#[test]
fn test_multi_bank_builds_per_bank_map() {
    let mut list = prefix("ws", "CALC");
    list.push("ignored".into());
    list.push(2.into());
    list.push(bank_maps(2));

    let config = ScaleConfig::from_list(&list).unwrap();
    let map = config.get_memory_map().unwrap();
    assert_eq!(map.num_banks(), 2);
    assert_eq!(
        map.mode(),
        &MapMode::PerBank {
            bank_maps: vec!["maps/bank0.csv".to_string(), "maps/bank1.csv".to_string()],
        }
    );
}

#[test]
fn test_single_bank_list_builds_single_bank_map() {
    let config = ScaleConfig::from_list(&prefix("ws", "CALC")).unwrap();
    assert_eq!(
        config.get_memory_map().map(|m| m.mode().clone()),
        Some(MapMode::SingleBank {
            filter_offset: 10_000_000,
            ofmap_offset: 20_000_000,
        })
    );
}

#[test]
fn test_topology_read_only_at_exactly_fifteen_entries() {
    let mut list = prefix("ws", "CALC");
    list.push("ignored".into());
    list.push(1.into());
    list.push(ConfListValue::Texts(Vec::new()));
    list.push("topologies/conv_nets/yolo_tiny.csv".into());
    assert_eq!(list.len(), ConfRecord::TOPOLOGY_LEN);

    let config = ScaleConfig::from_list(&list).unwrap();
    assert_eq!(config.get_topology_name().as_deref(), Some("yolo_tiny"));
}

#[test]
fn test_topology_ignored_beyond_fifteen_entries() {
    let mut list = prefix("ws", "CALC");
    list.push("ignored".into());
    list.push(1.into());
    list.push(ConfListValue::Texts(Vec::new()));
    list.push("topologies/conv_nets/yolo_tiny.csv".into());
    list.push("extra".into());

    let config = ScaleConfig::from_list(&list).unwrap();
    assert_eq!(config.get_topology_path(), Some(""));
}

#[test]
fn test_invalid_dataflow_is_kept_verbatim() {
    init_tracing();
    let config = ScaleConfig::from_list(&prefix("xyz", "CALC")).unwrap();
    assert!(config.is_valid());
    assert_eq!(
        config.get_dataflow(),
        Some(&Dataflow::Other("xyz".to_string()))
    );
    assert_eq!(config.get_dataflow().map(Dataflow::as_str), Some("xyz"));
}

#[test]
fn test_invalid_dataflow_logs_warning_on_list_path() {
    let mut list = prefix("xyz", "CALC");
    list.push(vec![0_u64].into());

    let (result, logs) = capture_logs(|| ScaleConfig::from_list(&list));
    assert!(result.is_ok());
    let warnings = lines_at(&logs, Level::WARN);
    assert_eq!(warnings.len(), 1, "logs:\n{logs}");
    assert!(warnings[0].contains("invalid dataflow"));
    assert!(warnings[0].contains("xyz"));
}

#[test]
fn test_wrong_entry_shape_is_reported_with_index() {
    let mut list = prefix("ws", "CALC");
    list[3] = ConfListValue::Ints(vec![1, 2]);

    let err = ScaleConfig::from_list(&list).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidListValue { index: 3, .. }));
}

#[test]
fn test_zero_banks_is_fatal() {
    let mut list = prefix("ws", "CALC");
    list.push("ignored".into());
    list.push(0.into());

    let err = ScaleConfig::from_list(&list).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroMemoryBanks));
}

#[test]
fn test_failed_list_load_keeps_previous_configuration() {
    let mut config = ScaleConfig::from_list(&prefix("os", "CALC")).unwrap();

    let mut bad = prefix("is", "USER");
    bad[0] = "bad".into();
    assert!(config.update_from_list(&bad).is_err());

    assert_eq!(config.get_run_name(), Some("run1"));
    assert_eq!(config.get_dataflow(), Some(&Dataflow::OutputStationary));
}

#[test]
fn test_decode_record_trailing_fields() {
    let mut list = prefix("ws", "USER");
    list.push(vec![5_u64, 6].into());
    list.push(2.into());
    list.push(bank_maps(2));

    let record = ConfRecord::decode(&list).unwrap();
    assert_eq!(record.bandwidths, Some(vec![5, 6]));
    assert_eq!(record.memory_banks, Some(2));
    assert_eq!(record.bank_maps.map(|maps| maps.len()), Some(2));
    assert_eq!(record.topology_file, None);
}
