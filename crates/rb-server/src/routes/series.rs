//! Series view routes.
//!
//! The grouping is recomputed from live catalog state on every call; there
//! is no parallel structure to drift out of sync.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use rb_db::pool::get_conn;
use rb_db::queries::series as q_series;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::entries::EntryResponse;

/// Episodes of one season, ordered by episode number ascending.
#[derive(Debug, Serialize)]
pub struct SeasonGroup {
    pub season: i64,
    pub episodes: Vec<EntryResponse>,
}

/// One series with its seasons in ascending order.
#[derive(Debug, Serialize)]
pub struct SeriesGroup {
    pub series_key: String,
    pub series_name: String,
    pub seasons: Vec<SeasonGroup>,
}

/// GET /api/series
pub async fn list_series(State(ctx): State<AppContext>) -> Result<impl IntoResponse, AppError> {
    let episodes = {
        let conn = get_conn(&ctx.db)?;
        q_series::list_tv_episodes(&conn)?
    };

    // Rows arrive ordered by (series_key, season, episode, insertion), so
    // grouping is a single pass.
    let mut groups: Vec<SeriesGroup> = Vec::new();
    for entry in episodes {
        let key = entry.series_key.clone().unwrap_or_default();
        let season = entry.grouping_season();

        if groups.last().map(|g| g.series_key.as_str()) != Some(key.as_str()) {
            groups.push(SeriesGroup {
                series_key: key.clone(),
                series_name: entry.series_name.clone().unwrap_or_default(),
                seasons: Vec::new(),
            });
        }
        let group = groups.last_mut().expect("group was just pushed");

        if group.seasons.last().map(|s| s.season) != Some(season) {
            group.seasons.push(SeasonGroup {
                season,
                episodes: Vec::new(),
            });
        }
        group
            .seasons
            .last_mut()
            .expect("season was just pushed")
            .episodes
            .push(EntryResponse::from(entry));
    }

    Ok(Json(groups))
}

#[derive(Debug, Deserialize)]
pub struct SeasonQuery {
    #[serde(default)]
    pub season: Option<i64>,
}

/// GET /api/series/{series_key}/episodes
pub async fn series_episodes(
    State(ctx): State<AppContext>,
    Path(series_key): Path<String>,
    Query(query): Query<SeasonQuery>,
) -> Result<impl IntoResponse, AppError> {
    let episodes = {
        let conn = get_conn(&ctx.db)?;
        q_series::episodes_for_series(&conn, &series_key, query.season)?
    };

    let episodes: Vec<EntryResponse> = episodes.into_iter().map(EntryResponse::from).collect();
    Ok(Json(episodes))
}
