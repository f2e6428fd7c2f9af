//! `/export` — admin-only CSV dump of every registration.

use chrono::SecondsFormat;
use tracing::{info, warn};

use crate::bot::worker::BotDeps;
use crate::channels::{IncomingMessage, OutgoingResponse};
use crate::error::Error;
use crate::intake::model::Registration;
use crate::intake::prompts;

pub const EXPORT_FILE_NAME: &str = "registrations.csv";

const HEADER: [&str; 7] = [
    "user_id",
    "handle",
    "first_name",
    "last_name_or_nick",
    "age",
    "games_answer",
    "updated_at",
];

/// Serialize registrations as CSV, header first, rows in the given order.
///
/// Missing handles and unreadable games answers become empty cells.
pub fn registrations_csv(registrations: &[Registration]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(|e| Error::Export(e.to_string()))?;

    for reg in registrations {
        writer
            .write_record([
                reg.user_id.to_string(),
                reg.handle.clone().unwrap_or_default(),
                reg.first_name.clone(),
                reg.last_name_or_nick.clone(),
                reg.age.to_string(),
                reg.games_answer
                    .map(|g| g.as_str().to_string())
                    .unwrap_or_default(),
                reg.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ])
            .map_err(|e| Error::Export(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Export(e.to_string()))
}

/// Reply to `/export`: the CSV for the admin, a refusal for anyone else.
pub async fn handle_export(deps: &BotDeps, msg: &IncomingMessage) -> Result<(), Error> {
    if !deps.is_admin(msg.user_id) {
        warn!(user_id = msg.user_id, "Export refused, not the admin");
        deps.channel
            .respond(msg, OutgoingResponse::text(prompts::ADMIN_ONLY))
            .await?;
        return Ok(());
    }

    let registrations = deps.store.fetch_all().await?;
    let bytes = registrations_csv(&registrations)?;
    let caption = prompts::export_caption(registrations.len());

    deps.channel
        .send_document(msg, EXPORT_FILE_NAME, bytes, Some(&caption))
        .await?;
    info!(rows = registrations.len(), "Registrations exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::intake::model::GamesAnswer;

    fn registration(
        user_id: i64,
        handle: Option<&str>,
        games: Option<GamesAnswer>,
    ) -> Registration {
        Registration {
            user_id,
            handle: handle.map(String::from),
            first_name: "Ann".into(),
            last_name_or_nick: "Smith, Jr.".into(),
            age: 17,
            games_answer: games,
            updated_at: DateTime::parse_from_rfc3339("2026-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn empty_export_has_header_only() {
        let bytes = registrations_csv(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "user_id,handle,first_name,last_name_or_nick,age,games_answer,updated_at\n"
        );
    }

    #[test]
    fn rows_follow_input_order_and_quote_commas() {
        let regs = vec![
            registration(2, Some("ann_s"), Some(GamesAnswer::Yes)),
            registration(1, None, None),
        ];
        let text = String::from_utf8(registrations_csv(&regs).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2,ann_s,Ann,\"Smith, Jr.\",17,yes,2026-05-01T12:00:00.000000Z"
        );
        assert_eq!(lines[2], "1,,Ann,\"Smith, Jr.\",17,,2026-05-01T12:00:00.000000Z");
    }
}
