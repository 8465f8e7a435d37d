//! Challenge and participant persistence.
//!
//! Participant progress is written with an optimistic version check, and
//! challenge completion is claimed with a conditional status update so only
//! one finalizer ever wins.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::badges::{BadgeAward, BadgeKind, Finalization};
use crate::challenges::{Challenge, ChallengeStatus, ChallengeType, Participant, ParticipantStatus, Privacy};
use crate::storage::database::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};

const CHALLENGE_COLUMNS: &str = "id, creator_id, name, description, challenge_type_json, target_value,
     start_date, end_date, privacy, status, created_at";

const PARTICIPANT_COLUMNS: &str = "id, challenge_id, user_id, current_progress, completion_percentage,
     status, joined_at, updated_at, version, last_milestone_notified";

/// Result of a version-checked progress write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressWrite {
    Applied,
    /// This workout was already counted for the participant
    AlreadyApplied,
    /// Another writer bumped the version first, or the participant left
    Conflict,
}

/// Challenge store.
pub struct ChallengeStore<'a> {
    conn: &'a Connection,
}

impl<'a> ChallengeStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Challenge Operations ==========

    /// Insert a new challenge.
    pub fn insert_challenge(&self, challenge: &Challenge) -> Result<(), DatabaseError> {
        let type_json = serde_json::to_string(&challenge.challenge_type)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO challenges (id, creator_id, name, description, challenge_type_json,
                 target_value, start_date, end_date, privacy, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    challenge.id.to_string(),
                    challenge.creator_id.to_string(),
                    challenge.name,
                    challenge.description,
                    type_json,
                    challenge.target_value,
                    format_timestamp(challenge.start_date),
                    format_timestamp(challenge.end_date),
                    challenge.privacy.as_str(),
                    challenge.status.as_str(),
                    format_timestamp(challenge.created_at),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a challenge by ID.
    pub fn get_challenge(&self, id: Uuid) -> Result<Option<Challenge>, DatabaseError> {
        let sql = format!("SELECT {} FROM challenges WHERE id = ?1", CHALLENGE_COLUMNS);
        self.conn
            .query_row(&sql, params![id.to_string()], ChallengeRow::from_row)
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .map(ChallengeRow::into_challenge)
            .transpose()
    }

    /// Challenges that have not been finalized, soonest end first.
    pub fn pending_challenges(&self) -> Result<Vec<Challenge>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM challenges WHERE status != 'completed' ORDER BY end_date ASC",
            CHALLENGE_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], ChallengeRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut challenges = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            challenges.push(row.into_challenge()?);
        }
        Ok(challenges)
    }

    /// Move an upcoming challenge to active. Returns false if it was not upcoming.
    pub fn activate_challenge(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let updated = self
            .conn
            .execute(
                "UPDATE challenges SET status = 'active' WHERE id = ?1 AND status = 'upcoming'",
                params![id.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(updated > 0)
    }

    /// Claim the active → completed transition and persist the awards.
    ///
    /// `plan` computes the finalization from the participants read inside the
    /// same transaction. Returns `None` when another finalizer already claimed
    /// the challenge or it was not active.
    pub fn claim_completion<F>(
        &self,
        challenge_id: Uuid,
        now: DateTime<Utc>,
        plan: F,
    ) -> Result<Option<Finalization>, DatabaseError>
    where
        F: FnOnce(&[Participant]) -> Finalization,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let claimed = tx
            .execute(
                "UPDATE challenges SET status = 'completed', finalized_at = ?1
                 WHERE id = ?2 AND status = 'active'",
                params![format_timestamp(now), challenge_id.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if claimed == 0 {
            return Ok(None);
        }

        let participants = self.participants(challenge_id)?;
        let finalization = plan(&participants);

        for award in &finalization.awards {
            tx.execute(
                "INSERT OR IGNORE INTO badge_awards
                 (id, challenge_id, participant_id, user_id, badge, final_rank,
                  completion_percentage, awarded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Uuid::new_v4().to_string(),
                    award.challenge_id.to_string(),
                    award.participant_id.to_string(),
                    award.user_id.to_string(),
                    award.badge.as_str(),
                    award.final_rank,
                    award.completion_percentage,
                    format_timestamp(award.awarded_at),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        }

        for participant_id in &finalization.completed_participants {
            tx.execute(
                "UPDATE participants SET status = 'completed', version = version + 1, updated_at = ?1
                 WHERE id = ?2 AND status = 'active'",
                params![format_timestamp(now), participant_id.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(Some(finalization))
    }

    /// Badge awards of a challenge, ordered by rank.
    pub fn awards_for_challenge(&self, challenge_id: Uuid) -> Result<Vec<BadgeAward>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT participant_id, user_id, badge, final_rank, completion_percentage, awarded_at
                 FROM badge_awards WHERE challenge_id = ?1
                 ORDER BY final_rank ASC, badge ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![challenge_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut awards = Vec::new();
        for row in rows {
            let (participant_str, user_str, badge_str, final_rank, completion_percentage, awarded_str) =
                row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            awards.push(BadgeAward {
                challenge_id,
                participant_id: parse_uuid(&participant_str)?,
                user_id: parse_uuid(&user_str)?,
                badge: parse_badge(&badge_str)?,
                final_rank,
                completion_percentage,
                awarded_at: parse_timestamp(&awarded_str)?,
            });
        }
        Ok(awards)
    }

    // ========== Participant Operations ==========

    /// Insert a participant record.
    pub fn insert_participant(&self, participant: &Participant) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO participants (id, challenge_id, user_id, current_progress,
                 completion_percentage, status, joined_at, updated_at, version, last_milestone_notified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    participant.id.to_string(),
                    participant.challenge_id.to_string(),
                    participant.user_id.to_string(),
                    participant.current_progress,
                    participant.completion_percentage,
                    participant.status.as_str(),
                    format_timestamp(participant.joined_at),
                    format_timestamp(participant.updated_at),
                    participant.version,
                    participant.last_milestone_notified,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a user's participant record for a challenge, withdrawn ones included.
    pub fn get_participant(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM participants WHERE challenge_id = ?1 AND user_id = ?2",
            PARTICIPANT_COLUMNS
        );
        let participant = self
            .conn
            .query_row(
                &sql,
                params![challenge_id.to_string(), user_id.to_string()],
                ParticipantRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .map(ParticipantRow::into_participant)
            .transpose()?;

        match participant {
            Some(mut p) => {
                p.badges = self.badges_for_participant(p.id)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    /// All participants of a challenge in join order.
    pub fn participants(&self, challenge_id: Uuid) -> Result<Vec<Participant>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM participants WHERE challenge_id = ?1 ORDER BY joined_at ASC",
            PARTICIPANT_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![challenge_id.to_string()], ParticipantRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut participants = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            let mut participant = row.into_participant()?;
            participant.badges = self.badges_for_participant(participant.id)?;
            participants.push(participant);
        }
        Ok(participants)
    }

    /// Number of non-withdrawn participants.
    pub fn participant_count(&self, challenge_id: Uuid) -> Result<u32, DatabaseError> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM participants WHERE challenge_id = ?1 AND status != 'withdrawn'",
                params![challenge_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// Unfinalized challenges the user is actively taking part in.
    pub fn challenges_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Challenge, Participant)>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT c.id FROM challenges c
                 JOIN participants p ON c.id = p.challenge_id
                 WHERE p.user_id = ?1 AND p.status = 'active' AND c.status != 'completed'
                 ORDER BY c.end_date",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let ids = stmt
            .query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut results = Vec::new();
        for id_str in ids {
            let challenge_id = parse_uuid(&id_str)?;
            if let (Some(challenge), Some(participant)) = (
                self.get_challenge(challenge_id)?,
                self.get_participant(challenge_id, user_id)?,
            ) {
                results.push((challenge, participant));
            }
        }
        Ok(results)
    }

    /// Write new progress if nobody else updated the participant since
    /// `expected_version` was read, and `workout_id` was not already counted.
    pub fn write_progress(
        &self,
        participant: &Participant,
        expected_version: i64,
        workout_id: Uuid,
    ) -> Result<ProgressWrite, DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let claimed = tx
            .execute(
                "INSERT OR IGNORE INTO participant_workouts (participant_id, workout_id, applied_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    participant.id.to_string(),
                    workout_id.to_string(),
                    format_timestamp(participant.updated_at),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if claimed == 0 {
            return Ok(ProgressWrite::AlreadyApplied);
        }

        let updated = tx
            .execute(
                "UPDATE participants SET current_progress = ?1, completion_percentage = ?2,
                 last_milestone_notified = ?3, updated_at = ?4, version = version + 1
                 WHERE id = ?5 AND version = ?6 AND status = 'active'",
                params![
                    participant.current_progress,
                    participant.completion_percentage,
                    participant.last_milestone_notified,
                    format_timestamp(participant.updated_at),
                    participant.id.to_string(),
                    expected_version,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if updated == 0 {
            // Dropping the transaction rolls back the workout claim.
            return Ok(ProgressWrite::Conflict);
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(ProgressWrite::Applied)
    }

    /// Mark a participant withdrawn. Returns false if already withdrawn or missing.
    pub fn withdraw_participant(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let updated = self
            .conn
            .execute(
                "UPDATE participants SET status = 'withdrawn', version = version + 1, updated_at = ?1
                 WHERE challenge_id = ?2 AND user_id = ?3 AND status != 'withdrawn'",
                params![
                    format_timestamp(now),
                    challenge_id.to_string(),
                    user_id.to_string()
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(updated > 0)
    }

    fn badges_for_participant(&self, participant_id: Uuid) -> Result<Vec<BadgeKind>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT badge FROM badge_awards WHERE participant_id = ?1")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![participant_id.to_string()], |row| row.get::<_, String>(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut badges = Vec::new();
        for row in rows {
            let badge_str = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            badges.push(parse_badge(&badge_str)?);
        }
        badges.sort();
        Ok(badges)
    }
}

fn parse_badge(s: &str) -> Result<BadgeKind, DatabaseError> {
    BadgeKind::from_str(s)
        .ok_or_else(|| DatabaseError::DeserializationError(format!("Unknown badge: {}", s)))
}

/// Intermediate struct for reading challenge rows from database.
struct ChallengeRow {
    id: String,
    creator_id: String,
    name: String,
    description: Option<String>,
    challenge_type_json: String,
    target_value: f64,
    start_date: String,
    end_date: String,
    privacy: String,
    status: String,
    created_at: String,
}

impl ChallengeRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            creator_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            challenge_type_json: row.get(4)?,
            target_value: row.get(5)?,
            start_date: row.get(6)?,
            end_date: row.get(7)?,
            privacy: row.get(8)?,
            status: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_challenge(self) -> Result<Challenge, DatabaseError> {
        let challenge_type: ChallengeType = serde_json::from_str(&self.challenge_type_json)
            .map_err(|e| {
                DatabaseError::DeserializationError(format!("Invalid challenge type JSON: {}", e))
            })?;
        let privacy = Privacy::from_str(&self.privacy).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("Unknown privacy: {}", self.privacy))
        })?;
        let status = ChallengeStatus::from_str(&self.status).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("Unknown challenge status: {}", self.status))
        })?;

        Ok(Challenge {
            id: parse_uuid(&self.id)?,
            creator_id: parse_uuid(&self.creator_id)?,
            name: self.name,
            description: self.description,
            challenge_type,
            target_value: self.target_value,
            start_date: parse_timestamp(&self.start_date)?,
            end_date: parse_timestamp(&self.end_date)?,
            privacy,
            status,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Intermediate struct for reading participant rows from database.
struct ParticipantRow {
    id: String,
    challenge_id: String,
    user_id: String,
    current_progress: f64,
    completion_percentage: f64,
    status: String,
    joined_at: String,
    updated_at: String,
    version: i64,
    last_milestone_notified: Option<u32>,
}

impl ParticipantRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            challenge_id: row.get(1)?,
            user_id: row.get(2)?,
            current_progress: row.get(3)?,
            completion_percentage: row.get(4)?,
            status: row.get(5)?,
            joined_at: row.get(6)?,
            updated_at: row.get(7)?,
            version: row.get(8)?,
            last_milestone_notified: row.get(9)?,
        })
    }

    fn into_participant(self) -> Result<Participant, DatabaseError> {
        let status = ParticipantStatus::from_str(&self.status).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("Unknown participant status: {}", self.status))
        })?;

        Ok(Participant {
            id: parse_uuid(&self.id)?,
            challenge_id: parse_uuid(&self.challenge_id)?,
            user_id: parse_uuid(&self.user_id)?,
            current_progress: self.current_progress,
            completion_percentage: self.completion_percentage,
            status,
            joined_at: parse_timestamp(&self.joined_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            version: self.version,
            last_milestone_notified: self.last_milestone_notified,
            badges: Vec::new(),
        })
    }
}
