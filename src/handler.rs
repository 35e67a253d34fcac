// HTTP handler bindings
//
// Thin wrappers that bind Rocket routes to the Bot:
// - Deserializing incoming JSON requests
// - Extracting the Bot instance from Rocket's managed state
// - Delegating to Bot methods
// - Serializing responses

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::bot::Bot;
use crate::geometry::Vec3;
use crate::types::{TurnReport, WorldSnapshot};

/// GET / endpoint
/// Returns bot metadata
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

/// POST /turn endpoint
/// Plans every live snake and returns the command body plus the decisions behind it
#[post("/turn", format = "json", data = "<snapshot>")]
pub async fn turn(
    bot: &rocket::State<Bot>,
    snapshot: Json<WorldSnapshot>,
) -> Result<Json<Value>, status::Custom<String>> {
    let report = bot
        .plan(snapshot.into_inner())
        .await
        .map_err(|e| status::Custom(Status::UnprocessableEntity, e.to_string()))?;

    Ok(Json(json!({
        "command": report.command_payload(),
        "report": report,
    })))
}

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub position: Vec3,
}

/// POST /targets/ban endpoint
#[post("/targets/ban", format = "json", data = "<ban>")]
pub fn ban_target(bot: &rocket::State<Bot>, ban: Json<BanRequest>) -> Json<Value> {
    let added = bot.ban_target(ban.position);
    Json(json!({ "position": ban.position, "added": added }))
}

/// GET /targets/banned endpoint
#[get("/targets/banned")]
pub fn list_banned(bot: &rocket::State<Bot>) -> Json<Vec<Vec3>> {
    Json(bot.banned())
}

/// DELETE /targets/banned endpoint
#[delete("/targets/banned")]
pub fn clear_banned(bot: &rocket::State<Bot>) -> Status {
    bot.clear_banned();
    Status::NoContent
}

/// GET /decisions endpoint
/// The most recent turn report; 404 before the first turn
#[get("/decisions")]
pub fn last_decisions(bot: &rocket::State<Bot>) -> Option<Json<TurnReport>> {
    bot.last_report().map(Json)
}
