//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{Error, TeamId, UserId};

fn invalid_id_error(field: &'static str, value: &str) -> Error {
    Error::invalid_request(format!("{field} must be a non-negative integer"))
        .with_details(json!({
            "field": field,
            "value": value,
            "code": "invalid_id",
        }))
}

fn parse_id(raw: &str, field: &'static str) -> Result<i64, Error> {
    raw.parse::<i64>()
        .ok()
        .filter(|value| *value >= 0)
        .ok_or_else(|| invalid_id_error(field, raw))
}

pub(crate) fn parse_user_id(raw: &str, field: &'static str) -> Result<UserId, Error> {
    parse_id(raw, field).map(UserId::new)
}

pub(crate) fn parse_team_id(raw: &str, field: &'static str) -> Result<TeamId, Error> {
    parse_id(raw, field).map(TeamId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc")]
    #[case("")]
    #[case("-4")]
    #[case("1.5")]
    #[case("9999999999999999999999")]
    fn rejects_malformed_ids(#[case] raw: &str) {
        let err = parse_user_id(raw, "id").expect_err("malformed id rejected");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "id");
        assert_eq!(details["value"], raw);
        assert_eq!(details["code"], "invalid_id");
    }

    #[rstest]
    fn accepts_plain_integers() {
        assert_eq!(
            parse_team_id("17", "team_id").expect("valid id"),
            TeamId::new(17)
        );
    }
}
