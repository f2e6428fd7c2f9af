//! User-facing texts: questions, re-prompts, confirmation and group summary.

use crate::channels::OutgoingResponse;

use super::model::Answers;
use super::session::Prompt;
use super::validate::Rejection;

/// Prefix for a summary re-routed to the admin after the group send failed.
pub const FALLBACK_PREFIX: &str = "⚠️ Не вдалося надіслати в групу. Ось реєстрація:\n\n";

pub const ADMIN_ONLY: &str = "Ця команда доступна лише адміну.";

/// Render a session prompt as a reply.
pub fn render(prompt: Prompt) -> OutgoingResponse {
    match prompt {
        Prompt::AskFirstName => {
            OutgoingResponse::markdown("Реєстрація на захід 📝\n\nВкажи *ім'я* учасника:")
        }
        Prompt::AskLastNameOrNick => OutgoingResponse::markdown(
            "Тепер напиши *прізвище* або *нікнейм* учасника\n\
             *(це потрібно для того, щоб підтвердити свою реєстрацію на вході)*:",
        ),
        Prompt::AskAge => OutgoingResponse::markdown("Вкажи *вік* учасника (числом):"),
        Prompt::AskGamesAnswer => OutgoingResponse::markdown(
            "Чи грав(-ла) учасник в одну або кілька з цих ігор: \
             Діксіт, Коднеймс (Кодові імена), Каркасон або Кольт Експрес?\n\n\
             Відповідь: *так / ні / не знаю*",
        ),
        Prompt::Rejected(rejection) => reprompt(rejection),
        Prompt::Cancelled => OutgoingResponse::text("Скасовано. Щоб почати знову — /start"),
    }
}

fn reprompt(rejection: Rejection) -> OutgoingResponse {
    match rejection {
        Rejection::InvalidName => OutgoingResponse::text(
            "Ім'я має бути літерами (можна з дефісом/апострофом). Спробуй ще раз.",
        ),
        Rejection::InvalidLength => {
            OutgoingResponse::text("Занадто коротко/довго. Напиши прізвище або нікнейм ще раз.")
        }
        Rejection::AgeNotANumber => {
            OutgoingResponse::text("Вік треба вказати числом. Наприклад: 18")
        }
        Rejection::AgeOutOfRange => {
            OutgoingResponse::text("Перевір вік — введи число від 5 до 120.")
        }
        Rejection::UnrecognizedGamesAnswer => {
            OutgoingResponse::markdown("Будь ласка, відповідай: *так* / *ні* / *не знаю*.")
        }
    }
}

/// Plain-text confirmation for the user. Answers are echoed verbatim, so no
/// Markdown.
pub fn confirmation(answers: &Answers) -> OutgoingResponse {
    OutgoingResponse::text(format!(
        "✅ Реєстрацію збережено!\n\
         Ім'я: {}\n\
         Прізвище/нік: {}\n\
         Вік: {}\n\
         Досвід з іграми: {}\n\n\
         Якщо треба змінити — натисни /start ще раз.",
        answers.first_name,
        answers.last_name_or_nick,
        answers.age,
        answers.games_answer.label(),
    ))
}

/// Plain-text summary broadcast to the group.
pub fn group_summary(user_id: i64, handle: Option<&str>, answers: &Answers) -> String {
    let handle = handle
        .map(|h| format!("@{h}"))
        .unwrap_or_else(|| "—".to_string());

    format!(
        "📝 Нова реєстрація\n\
         • Ім'я: {}\n\
         • Прізвище/нік: {}\n\
         • Вік: {}\n\
         • Грав(-ла) в ці ігри?: {}\n\
         • TG: {handle}\n\
         • ID: {user_id}",
        answers.first_name,
        answers.last_name_or_nick,
        answers.age,
        answers.games_answer.label(),
    )
}

pub fn export_caption(count: usize) -> String {
    format!("Всього реєстрацій: {count}")
}
