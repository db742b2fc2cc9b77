//! Current user tools: profile and top tracks.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::TrackSummary;
use crate::api::model::{Paging, Track, UserProfile};
use crate::domains::tools::definitions::common::{NoParams, check_range};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolResult};

const MAX_LIMIT: u32 = 50;
const MAX_OFFSET: u32 = 10_000;

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProfileResult {
    pub id: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    pub uri: Option<String>,
}

impl From<UserProfile> for ProfileResult {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name,
            email: profile.email,
            country: profile.country,
            product: profile.product,
            followers: profile.followers.and_then(|f| f.total),
            uri: profile.uri,
        }
    }
}

/// Profile tool - the authenticated user's Spotify profile.
pub struct CurrentUserProfileTool;

#[async_trait]
impl ToolDefinition for CurrentUserProfileTool {
    const NAME: &'static str = "current_user_profile";
    const DESCRIPTION: &'static str = "Get the current user's Spotify profile. The `id` field is the \
        user id needed to create playlists.";

    type Params = NoParams;
    type Output = ProfileResult;

    async fn execute(ctx: &ToolContext, _params: Self::Params) -> ToolResult<Self::Output> {
        info!("Profile tool called");
        let profile: UserProfile = ctx.spotify().get("/me", &[] as &[(&str, &str)]).await?;
        Ok(profile.into())
    }
}

// ============================================================================
// Top tracks
// ============================================================================

/// Time window over which top tracks are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last 4 weeks.
    #[default]
    ShortTerm,
    /// Roughly the last 6 months.
    MediumTerm,
    /// Several years.
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        }
    }
}

/// Parameters for the top tracks tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CurrentUserTopTracksParams {
    /// Time window (default: short_term). Pick the closest one to what was asked.
    #[serde(default)]
    pub time_range: TimeRange,

    /// Number of tracks, 1-50 (default: 10).
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Index of the first track, 0-10000 (default: 0).
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Serialize)]
pub struct TopTracksResult {
    pub time_range: TimeRange,
    pub tracks: Vec<TrackSummary>,
    pub total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
}

/// Top tracks tool - the user's most played tracks, ranked.
pub struct CurrentUserTopTracksTool;

#[async_trait]
impl ToolDefinition for CurrentUserTopTracksTool {
    const NAME: &'static str = "current_user_top_tracks";
    const DESCRIPTION: &'static str = "Get the current user's top tracks, ranked from 1. time_range is \
        short_term (about 4 weeks), medium_term (about 6 months) or long_term (several years).";

    type Params = CurrentUserTopTracksParams;
    type Output = TopTracksResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        check_range("limit", params.limit, 1, MAX_LIMIT)?;
        check_range("offset", params.offset, 0, MAX_OFFSET)
    }

    #[instrument(skip_all, fields(time_range = params.time_range.as_str()))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Top tracks tool called");

        let query = [
            ("time_range", params.time_range.as_str().to_string()),
            ("limit", params.limit.to_string()),
            ("offset", params.offset.to_string()),
        ];
        let page: Paging<Track> = ctx.spotify().get("/me/top/tracks", &query).await?;

        let next_offset = page.next_offset(page.items.len());
        let tracks = page
            .items
            .into_iter()
            .flatten()
            .zip(params.offset.saturating_add(1)..)
            .map(|(track, rank)| TrackSummary {
                rank: Some(rank),
                ..TrackSummary::from(track)
            })
            .collect();

        Ok(TopTracksResult {
            time_range: params.time_range,
            tracks,
            total: page.total,
            next_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ToolError;
    use crate::test_support::MockProviders;

    #[tokio::test]
    async fn test_profile() {
        let mock = MockProviders::start().await;
        let profile = CurrentUserProfileTool::execute(&mock.context(), NoParams {})
            .await
            .unwrap();
        assert_eq!(profile.id, "test-user");
        assert_eq!(profile.display_name.as_deref(), Some("Test User"));
        assert_eq!(profile.followers, Some(7));
    }

    #[test]
    fn test_time_range_values() {
        let p: CurrentUserTopTracksParams =
            serde_json::from_value(serde_json::json!({ "time_range": "long_term" })).unwrap();
        assert_eq!(p.time_range, TimeRange::LongTerm);
        assert_eq!(p.limit, 10);

        let err = serde_json::from_value::<CurrentUserTopTracksParams>(
            serde_json::json!({ "time_range": "two_months" }),
        );
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_top_tracks_ranked_from_offset() {
        let mock = MockProviders::start().await;
        let params = CurrentUserTopTracksParams {
            time_range: TimeRange::MediumTerm,
            limit: 2,
            offset: 1,
        };

        let result = CurrentUserTopTracksTool::execute(&mock.context(), params)
            .await
            .unwrap();

        let ranked: Vec<(Option<u32>, &str)> = result
            .tracks
            .iter()
            .map(|t| (t.rank, t.name.as_str()))
            .collect();
        assert_eq!(ranked, vec![(Some(2), "Karma Police"), (Some(3), "No Surprises")]);
        assert_eq!(result.total, 3);
        assert_eq!(result.next_offset, None);
        assert_eq!(
            mock.state.last_query().get("time_range").map(String::as_str),
            Some("medium_term")
        );
    }

    #[tokio::test]
    async fn test_top_tracks_offset_bound() {
        let mock = MockProviders::start().await;
        let registry = crate::domains::tools::ToolRegistry::new(mock.context());
        let args = serde_json::json!({ "offset": u32::MAX });

        let err = registry
            .dispatch(
                CurrentUserTopTracksTool::NAME,
                args.as_object().cloned().unwrap(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("offset"));
        assert_eq!(mock.state.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_top_tracks_last_allowed_offset() {
        let mock = MockProviders::start().await;
        let params = CurrentUserTopTracksParams {
            time_range: TimeRange::ShortTerm,
            limit: 5,
            offset: MAX_OFFSET,
        };
        assert!(CurrentUserTopTracksTool::validate(&params).is_ok());

        let result = CurrentUserTopTracksTool::execute(&mock.context(), params)
            .await
            .unwrap();
        assert!(result.tracks.is_empty());
        assert_eq!(result.next_offset, None);
    }

    #[tokio::test]
    async fn test_profile_timeout() {
        let mock = MockProviders::start().await;
        mock.state.set_me_delay(std::time::Duration::from_millis(1500));
        let ctx = mock.context_with_timeout(std::time::Duration::from_millis(200));

        let err = CurrentUserProfileTool::execute(&ctx, NoParams {})
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
        assert_eq!(err.kind(), "timeout_error");
    }
}
