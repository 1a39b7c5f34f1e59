use uuid::Uuid;

use crate::db::LinkRecord;

use super::StatusReport;
use super::codes::CODE_LENGTH;

pub(crate) const LINKING_DISABLED_MESSAGE: &str = "Account linking is currently disabled.";
pub(crate) const INVALID_CODE_MESSAGE: &str =
    "Invalid or expired code. Use /link in Minecraft to get a new one.";
pub(crate) const LINKED_MESSAGE: &str = "Successfully linked to Minecraft account!";
pub(crate) const RECONNECTING_MESSAGE: &str = "Attempting to reconnect to SQL database...";
pub(crate) const RECONNECTED_MESSAGE: &str = "SQL database reconnected!";
pub(crate) const RECONNECT_FAILED_MESSAGE: &str = "Reconnection failed. Check console.";
pub(crate) const NO_LINK_DATA_MESSAGE: &str = "No link data found.";
pub(crate) const LOOKUP_HEADER: &str = "--- Discord Link Lookup ---";
pub(crate) const STATUS_HEADER: &str = "--- Discord Bridge Status ---";

/// Trims `input` and returns it only if it has the shape of an issued code.
pub(crate) fn normalize_code(input: &str) -> Option<&str> {
    let code = input.trim();
    (code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())).then_some(code)
}

pub(crate) fn normalize_discord_id(input: &str) -> Option<&str> {
    let id = input.trim();
    (!id.is_empty()).then_some(id)
}

pub(crate) fn code_issued_messages(code: &str) -> [String; 2] {
    [
        format!("Your linking code is: {code}"),
        format!("Type /link {code} in Discord to finish linking."),
    ]
}

pub(crate) fn lookup_lines(records: &[LinkRecord]) -> Vec<(Uuid, String)> {
    records
        .iter()
        .map(|record| (record.player_id, record.summary()))
        .collect()
}

pub(crate) fn status_lines(report: &StatusReport) -> Vec<String> {
    let linking = if report.linking_enabled { "enabled" } else { "disabled" };
    vec![
        STATUS_HEADER.to_string(),
        format!("Link backend: {} ({})", report.backend, report.status),
        format!("SQL Database: {}", report.sql_status),
        format!("Linking: {linking}"),
        format!("Pending codes: {}", report.pending_codes),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use test_case::test_case;
    use uuid::Uuid;

    use super::{
        code_issued_messages, lookup_lines, normalize_code, normalize_discord_id, status_lines,
    };
    use crate::bridge::StatusReport;
    use crate::db::{BackendKind, LinkRecord, StoreStatus};

    #[test_case("0042", Some("0042") ; "plain code")]
    #[test_case("  1234\n", Some("1234") ; "surrounding whitespace")]
    #[test_case("123", None ; "too short")]
    #[test_case("12345", None ; "too long")]
    #[test_case("12a4", None ; "non digit")]
    #[test_case("", None ; "empty")]
    #[test_case("١٢٣٤", None ; "non ascii digits")]
    fn normalize_code_accepts_only_four_ascii_digits(input: &str, expected: Option<&str>) {
        assert_eq!(normalize_code(input), expected);
    }

    #[test_case("123456789012345678", Some("123456789012345678") ; "snowflake")]
    #[test_case(" 42 ", Some("42") ; "trimmed")]
    #[test_case("   ", None ; "blank")]
    fn normalize_discord_id_rejects_blank(input: &str, expected: Option<&str>) {
        assert_eq!(normalize_discord_id(input), expected);
    }

    #[test]
    fn code_issued_messages_include_code_twice() {
        let [first, second] = code_issued_messages("0815");
        assert_eq!(first, "Your linking code is: 0815");
        assert_eq!(second, "Type /link 0815 in Discord to finish linking.");
    }

    #[test]
    fn lookup_lines_render_summary_per_record() {
        let player = Uuid::new_v4();
        let records = vec![
            LinkRecord {
                player_id: player,
                discord_id: "1001".to_string(),
                linked_at: NaiveDate::from_ymd_opt(2024, 3, 9),
            },
            LinkRecord {
                player_id: Uuid::nil(),
                discord_id: "1002".to_string(),
                linked_at: None,
            },
        ];

        let lines = lookup_lines(&records);

        assert_eq!(lines[0], (player, "ID: 1001 | Linked: 2024-03-09".to_string()));
        assert_eq!(lines[1], (Uuid::nil(), "ID: 1002 | Linked: Unknown".to_string()));
    }

    #[test]
    fn status_lines_show_backend_and_state() {
        let report = StatusReport {
            backend: BackendKind::Sql,
            status: StoreStatus::Offline,
            sql_status: StoreStatus::Offline,
            linking_enabled: true,
            pending_codes: 2,
        };

        let lines = status_lines(&report);

        assert_eq!(lines[1], "Link backend: sql (OFFLINE)");
        assert_eq!(lines[2], "SQL Database: OFFLINE");
        assert_eq!(lines[3], "Linking: enabled");
        assert_eq!(lines[4], "Pending codes: 2");
    }
}
