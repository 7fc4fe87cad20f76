//! Property-based tests for virtual backend name composition.
//!
//! For any `@`-free halves, `parse(compose(d, e)) == (d, e)`, and parsing
//! always splits on the first separator.

use proptest::prelude::*;
use skinfaxi_sched::BackendRouter;

proptest! {
    #[test]
    fn compose_parse_roundtrip(
        device in "[a-z0-9_]{1,24}",
        executor in "[a-z0-9_]{1,16}",
    ) {
        let name = BackendRouter::compose(&device, &executor).unwrap();
        let (d, e) = BackendRouter::parse(&name).unwrap();
        prop_assert_eq!(d, device.as_str());
        prop_assert_eq!(e, executor.as_str());
    }

    #[test]
    fn compose_rejects_separator_in_either_half(
        tainted in "[a-z_]{0,8}@[a-z_]{0,8}",
        clean in "[a-z_]{1,8}",
    ) {
        prop_assert!(BackendRouter::compose(&tainted, &clean).is_err());
        prop_assert!(BackendRouter::compose(&clean, &tainted).is_err());
    }

    #[test]
    fn parse_never_panics(name in ".*") {
        let _ = BackendRouter::parse(&name);
    }

    #[test]
    fn parse_splits_on_first_separator(
        prefix in "[a-z_]{1,8}",
        suffix in "[a-z@_]{1,8}",
    ) {
        let name = format!("{prefix}@{suffix}");
        let (d, e) = BackendRouter::parse(&name).unwrap();
        prop_assert_eq!(d, prefix.as_str());
        prop_assert_eq!(e, suffix.as_str());
    }
}
