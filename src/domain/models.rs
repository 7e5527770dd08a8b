use crate::domain::error::AppResult;
use crate::domain::progress::ActiveSession;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Scanning,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Scanning => "Scanning",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Error",
        }
    }
}

/// A peripheral seen during a scan. `id` is the platform peripheral id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedDevice {
    pub id: String,
    pub name: String,
    pub signal_strength: Option<i16>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, severity: MessageSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BluetoothCommand {
    StartScan,
    StopScan,
    Connect(String),
    Disconnect,
    /// Feed a raw payload through the notification path (debug tab)
    InjectNotification(Vec<u8>),
}

/// Everything the background tasks report back to the UI thread.
#[derive(Debug, Clone)]
pub enum AppEvent {
    // Sensor
    ConnectionStatus(ConnectionStatus),
    DeviceFound(ScannedDevice),
    ImpactCount(i32),
    ShotRecorded { block_id: i64, made_shots: u32 },
    SessionComplete { session_id: i64 },
    LogMessage(StatusMessage),

    // API replies
    LoggedIn(AppResult<User>),
    Registered(AppResult<()>),
    SessionStarted(AppResult<ActiveSession>),
    SessionFinished(AppResult<i64>),
    SessionLoaded(AppResult<SessionDetails>),
    SessionsListed(AppResult<Vec<SessionSummary>>),
    DashboardLoaded(AppResult<DashboardStats>),
    LeaderboardLoaded(AppResult<Vec<LeaderboardEntry>>),
    ProfileUpdated(AppResult<User>),
    PasswordChanged(AppResult<()>),
    AccountDeleted(AppResult<()>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetArea {
    #[default]
    #[serde(rename = "Top Right")]
    TopRight,
    #[serde(rename = "Top Left")]
    TopLeft,
    #[serde(rename = "Bottom Right")]
    BottomRight,
    #[serde(rename = "Bottom Left")]
    BottomLeft,
    #[serde(rename = "Top Shelf")]
    TopShelf,
    #[serde(rename = "Right Pipe")]
    RightPipe,
    #[serde(rename = "Left Pipe")]
    LeftPipe,
    #[serde(rename = "Five Hole")]
    FiveHole,
}

impl TargetArea {
    pub const ALL: [TargetArea; 8] = [
        TargetArea::TopRight,
        TargetArea::TopLeft,
        TargetArea::BottomRight,
        TargetArea::BottomLeft,
        TargetArea::TopShelf,
        TargetArea::RightPipe,
        TargetArea::LeftPipe,
        TargetArea::FiveHole,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TargetArea::TopRight => "Top Right",
            TargetArea::TopLeft => "Top Left",
            TargetArea::BottomRight => "Bottom Right",
            TargetArea::BottomLeft => "Bottom Left",
            TargetArea::TopShelf => "Top Shelf",
            TargetArea::RightPipe => "Right Pipe",
            TargetArea::LeftPipe => "Left Pipe",
            TargetArea::FiveHole => "Five Hole",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotResult {
    #[serde(alias = "made", alias = "MADE")]
    Made,
    #[serde(alias = "missed", alias = "MISSED")]
    Missed,
}

/// Block definition submitted when creating a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPlan {
    pub target_area: TargetArea,
    pub shots_planned: u32,
}

impl Default for BlockPlan {
    fn default() -> Self {
        Self {
            target_area: TargetArea::default(),
            shots_planned: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(alias = "block_id", alias = "BlockID")]
    pub id: i64,
    #[serde(alias = "targetArea", alias = "TargetArea")]
    pub target_area: TargetArea,
    #[serde(alias = "shotsPlanned", alias = "ShotsPlanned")]
    pub shots_planned: u32,
    #[serde(default, alias = "madeShots", alias = "MadeShots")]
    pub made_shots: u32,
    #[serde(default, alias = "missedShots", alias = "MissedShots")]
    pub missed_shots: u32,
}

impl Block {
    pub fn is_finished(&self) -> bool {
        self.made_shots >= self.shots_planned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    #[serde(alias = "shot_id", alias = "ShotID")]
    pub id: i64,
    #[serde(default, alias = "BlockID")]
    pub block_id: Option<i64>,
    #[serde(default, alias = "shot_time", alias = "ShotTime")]
    pub time: Option<String>,
    /// Horizontal position in feet
    #[serde(alias = "shot_position_x", alias = "ShotPositionX")]
    pub x: f32,
    /// Vertical position in feet
    #[serde(alias = "shot_position_y", alias = "ShotPositionY")]
    pub y: f32,
    #[serde(alias = "Result")]
    pub result: ShotResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "UserID")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionDetails {
    #[serde(alias = "SessionID")]
    pub session_id: i64,
    #[serde(default, alias = "UserID")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "MadeShots")]
    pub made_shots: u32,
    #[serde(default, alias = "MissedShots")]
    pub missed_shots: u32,
    #[serde(default, alias = "TotalShots")]
    pub total_shots: u32,
    #[serde(default, alias = "ShootingPercentage")]
    pub shooting_percentage: String,
    #[serde(default, alias = "Blocks")]
    pub blocks: Vec<Block>,
    #[serde(default, alias = "Shots")]
    pub shots: Vec<Shot>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SessionRow")]
pub struct SessionSummary {
    pub session_id: i64,
    pub user_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// The list endpoint has answered both objects and positional rows
/// `[SessionID, UserID, StartTime, EndTime]` across server versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum SessionRow {
    Object {
        #[serde(alias = "sessionId", alias = "SessionID")]
        session_id: i64,
        #[serde(default, alias = "userId", alias = "UserID")]
        user_id: Option<i64>,
        #[serde(default, alias = "startTime", alias = "StartTime")]
        start_time: Option<String>,
        #[serde(default, alias = "endTime", alias = "EndTime")]
        end_time: Option<String>,
    },
    Positional(Vec<serde_json::Value>),
}

impl TryFrom<SessionRow> for SessionSummary {
    type Error = String;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(match row {
            SessionRow::Object {
                session_id,
                user_id,
                start_time,
                end_time,
            } => Self {
                session_id,
                user_id,
                start_time,
                end_time,
            },
            SessionRow::Positional(values) => {
                let text = |i: usize| {
                    values
                        .get(i)
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                };
                let session_id = values
                    .first()
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| format!("session row without an id: {:?}", values))?;
                Self {
                    session_id,
                    user_id: values.get(1).and_then(|v| v.as_i64()),
                    start_time: text(2),
                    end_time: text(3),
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub all_time_accuracy: String,
    pub last_session_accuracy: String,
    pub streak: i64,
    pub total_made: u32,
    pub total_planned: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "UserID", alias = "user_id")]
    pub user_id: i64,
    #[serde(rename = "FullName", alias = "full_name")]
    pub full_name: String,
    #[serde(rename = "TotalMade", alias = "total_made", default)]
    pub total_made: u32,
    #[serde(rename = "TotalPlanned", alias = "total_planned", default)]
    pub total_planned: u32,
    #[serde(rename = "AccuracyPercent", alias = "accuracy_percent", default)]
    pub accuracy_percent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardSort {
    #[default]
    Accuracy,
    TotalMade,
}

impl LeaderboardSort {
    pub fn as_query(&self) -> &'static str {
        match self {
            LeaderboardSort::Accuracy => "accuracy",
            LeaderboardSort::TotalMade => "total_made",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaderboardSort::Accuracy => "Accuracy",
            LeaderboardSort::TotalMade => "Total Made",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_rows_accept_both_shapes() {
        let json = r#"[
            {"sessionId": 3, "userId": 1, "startTime": "2024-01-01 10:00", "endTime": null},
            [4, 1, "2024-01-02 10:00", "2024-01-02 11:00"]
        ]"#;
        let rows: Vec<SessionSummary> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].session_id, 3);
        assert_eq!(rows[0].end_time, None);
        assert_eq!(rows[1].session_id, 4);
        assert_eq!(rows[1].end_time.as_deref(), Some("2024-01-02 11:00"));
    }

    #[test]
    fn test_default_plan_targets_top_right() {
        assert_eq!(TargetArea::default(), TargetArea::TopRight);
        assert_eq!(BlockPlan::default().target_area, TargetArea::TopRight);
    }

    #[test]
    fn test_session_row_without_id_is_rejected() {
        let json = r#"[["oops", 1, "2024-01-02 10:00", null]]"#;
        assert!(serde_json::from_str::<Vec<SessionSummary>>(json).is_err());
    }

    #[test]
    fn test_block_accepts_server_pascal_case() {
        let json = r#"{"BlockID": 9, "TargetArea": "Five Hole", "ShotsPlanned": 5, "MadeShots": 4}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.id, 9);
        assert_eq!(block.target_area, TargetArea::FiveHole);
        assert_eq!(block.missed_shots, 0);
        assert!(!block.is_finished());
    }

    #[test]
    fn test_block_plan_wire_format() {
        let plan = BlockPlan {
            target_area: TargetArea::TopShelf,
            shots_planned: 12,
        };
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"targetArea": "Top Shelf", "shotsPlanned": 12})
        );
    }

    #[test]
    fn test_leaderboard_entry_fields() {
        let json = r#"{"UserID": 2, "FullName": "Sam", "TotalMade": 40, "TotalPlanned": 50, "AccuracyPercent": "80.0%"}"#;
        let entry: LeaderboardEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.full_name, "Sam");
        assert_eq!(entry.total_made, 40);
    }
}
