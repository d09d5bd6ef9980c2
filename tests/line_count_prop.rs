//! Line counting and mode codec property tests
//!
//! The byte scan must agree with a simple split-based model, and every
//! appended line must come back from a read in write order.

use filereg::file::io::count_lines;
use filereg::file::metadata::{mode_to_string, parse_permission};
use filereg::{FileRegistry, RegistryConfig, WriteMode};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use tempfile::tempdir;

fn model_line_count(content: &str) -> usize {
    if content.is_empty() {
        return 0;
    }
    let trimmed = content.strip_suffix('\n').unwrap_or(content);
    trimmed.matches('\n').count() + 1
}

fn line_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,40}".prop_map(|body| format!("{}\n", body))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn count_lines_matches_model(content in "[ab\n]{0,64}") {
        let stats = count_lines(content.as_bytes()).unwrap();
        prop_assert_eq!(stats.char_count, content.len());
        prop_assert_eq!(stats.line_count, model_line_count(&content));
    }

    #[test]
    fn mode_string_round_trips_through_octal(bits in 0u32..0o1000) {
        let rendered = mode_to_string(bits);
        prop_assert_eq!(rendered.len(), 9);

        let parsed = parse_permission(&format!("{:04o}", bits)).unwrap();
        prop_assert_eq!(parsed, bits);
        prop_assert_eq!(mode_to_string(parsed), rendered);
    }

    #[test]
    fn appended_lines_read_back_in_order(lines in proptest::collection::vec(line_strategy(), 1..12)) {
        let temp_dir = tempdir().unwrap();
        let mut registry: FileRegistry =
            FileRegistry::with_config(RegistryConfig::default().with_base_dir(temp_dir.path()));
        registry.new_file("prop.txt").unwrap();

        registry.write(0, &lines[0], WriteMode::Truncate).unwrap();
        for line in &lines[1..] {
            registry.write(0, line, WriteMode::Append).unwrap();
        }

        prop_assert_eq!(registry.line_count(0).unwrap(), lines.len());
        prop_assert_eq!(registry.read(0).unwrap(), lines.as_slice());
    }
}
