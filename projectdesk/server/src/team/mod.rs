//! Teams and their memberships.
//!
//! A team is a named group of users. Membership rows are first class: they
//! can be listed, added and removed one by one through `/team-members`, or
//! replaced wholesale when a team is created or updated with `memberIds`.

use crate::entities::*;
use crate::web::api::v1::optional_id;
use sea_orm::sea_query::IntoCondition;
use sea_orm::*;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when creating a team.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: Option<String>,
    #[serde(default, alias = "members")]
    pub member_ids: Option<Vec<i32>>,
}

/// Fields accepted when updating a team. `memberIds`, when present, replaces
/// the whole membership.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamChanges {
    pub name: Option<String>,
    #[serde(default, alias = "members")]
    pub member_ids: Option<Vec<i32>>,
}

/// Fields accepted when adding one user to a team.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    #[serde(default, deserialize_with = "optional_id")]
    pub team_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<i32>,
}

/// A membership row together with the user it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub member: team_member::Model,
    pub user: user::Model,
}

/// A team with its members, in the order they joined.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDetails {
    pub team: team::Model,
    pub members: Vec<Membership>,
}

#[derive(Debug, thiserror::Error)]
pub enum TeamServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Team with ID {0} not found")]
    TeamNotFound(i32),
    #[error("Team member with ID {0} not found")]
    MemberNotFound(i32),
    #[error("User with ID {0} not found")]
    UserNotFound(i32),
    #[error("User {user_id} is already a member of team {team_id}")]
    AlreadyMember { team_id: i32, user_id: i32 },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct TeamService<'a> {
    db: &'a DatabaseConnection,
}

impl TeamService<'_> {
    pub fn new(db: &DatabaseConnection) -> TeamService<'_> {
        TeamService { db }
    }

    /// Creates a team and its initial members in one transaction.
    #[tracing::instrument(skip(self))]
    pub async fn create_team(&self, new_team: NewTeam) -> Result<TeamDetails, TeamServiceError> {
        let name = new_team
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(TeamServiceError::MissingField("name"))?;

        let txn = self.db.begin().await?;
        let team = team::ActiveModel {
            name: ActiveValue::Set(name),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        if let Some(member_ids) = new_team.member_ids {
            set_members(&txn, team.id, member_ids).await?;
        }
        txn.commit().await?;

        self.get_team(team.id).await
    }

    /// Lists teams, newest first, each with its members.
    #[tracing::instrument(skip(self))]
    pub async fn list_teams(&self) -> Result<Vec<TeamDetails>, TeamServiceError> {
        let teams = team::Entity::find()
            .order_by_desc(team::Column::CreatedAt)
            .order_by_desc(team::Column::Id)
            .all(self.db)
            .await?;
        if teams.is_empty() {
            return Ok(Vec::new());
        }

        let team_ids: Vec<i32> = teams.iter().map(|team| team.id).collect();
        let mut by_team: HashMap<i32, Vec<Membership>> = HashMap::new();
        for membership in
            load_memberships(self.db, team_member::Column::TeamId.is_in(team_ids)).await?
        {
            by_team
                .entry(membership.member.team_id)
                .or_default()
                .push(membership);
        }

        Ok(teams
            .into_iter()
            .map(|team| {
                let members = by_team.remove(&team.id).unwrap_or_default();
                TeamDetails { team, members }
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_team(&self, id: i32) -> Result<TeamDetails, TeamServiceError> {
        let team = team::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TeamServiceError::TeamNotFound(id))?;
        let members = load_memberships(self.db, team_member::Column::TeamId.eq(id)).await?;
        Ok(TeamDetails { team, members })
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_team(
        &self,
        id: i32,
        changes: TeamChanges,
    ) -> Result<TeamDetails, TeamServiceError> {
        let txn = self.db.begin().await?;
        let team = team::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(TeamServiceError::TeamNotFound(id))?;

        if let Some(name) = changes.name {
            if name.trim().is_empty() {
                return Err(TeamServiceError::MissingField("name"));
            }
            let mut active_model: team::ActiveModel = team.into();
            active_model.name = ActiveValue::Set(name);
            active_model.update(&txn).await?;
        }
        if let Some(member_ids) = changes.member_ids {
            team_member::Entity::delete_many()
                .filter(team_member::Column::TeamId.eq(id))
                .exec(&txn)
                .await?;
            set_members(&txn, id, member_ids).await?;
        }
        txn.commit().await?;

        self.get_team(id).await
    }

    /// Deletes a team. Its memberships go with it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_team(&self, id: i32) -> Result<(), TeamServiceError> {
        let result = team::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(TeamServiceError::TeamNotFound(id));
        }
        Ok(())
    }

    /// Lists memberships, optionally restricted to one team.
    #[tracing::instrument(skip(self))]
    pub async fn list_members(
        &self,
        team_id: Option<i32>,
    ) -> Result<Vec<Membership>, TeamServiceError> {
        let condition = match team_id {
            Some(team_id) => Condition::all().add(team_member::Column::TeamId.eq(team_id)),
            None => Condition::all(),
        };
        load_memberships(self.db, condition).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_member(
        &self,
        new_member: NewTeamMember,
    ) -> Result<Membership, TeamServiceError> {
        let team_id = new_member
            .team_id
            .ok_or(TeamServiceError::MissingField("teamId"))?;
        let user_id = new_member
            .user_id
            .ok_or(TeamServiceError::MissingField("userId"))?;

        team::Entity::find_by_id(team_id)
            .one(self.db)
            .await?
            .ok_or(TeamServiceError::TeamNotFound(team_id))?;
        let user = user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or(TeamServiceError::UserNotFound(user_id))?;

        let existing = team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .filter(team_member::Column::UserId.eq(user_id))
            .count(self.db)
            .await?;
        if existing > 0 {
            return Err(TeamServiceError::AlreadyMember { team_id, user_id });
        }

        let member = team_member::ActiveModel {
            team_id: ActiveValue::Set(team_id),
            user_id: ActiveValue::Set(user_id),
            ..Default::default()
        }
        .insert(self.db)
        .await?;
        Ok(Membership { member, user })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_member(&self, id: i32) -> Result<Membership, TeamServiceError> {
        load_memberships(self.db, team_member::Column::Id.eq(id))
            .await?
            .pop()
            .ok_or(TeamServiceError::MemberNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_member(&self, id: i32) -> Result<(), TeamServiceError> {
        let result = team_member::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(TeamServiceError::MemberNotFound(id));
        }
        Ok(())
    }
}

/// Inserts one membership per distinct id in `member_ids`. Every id must
/// name an existing user.
async fn set_members<C>(db: &C, team_id: i32, member_ids: Vec<i32>) -> Result<(), TeamServiceError>
where
    C: ConnectionTrait,
{
    let member_ids: BTreeSet<i32> = member_ids.into_iter().collect();
    if member_ids.is_empty() {
        return Ok(());
    }

    let found: BTreeSet<i32> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Id.is_in(member_ids.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = member_ids.difference(&found).next() {
        return Err(TeamServiceError::UserNotFound(*missing));
    }

    team_member::Entity::insert_many(member_ids.into_iter().map(|user_id| {
        team_member::ActiveModel {
            team_id: ActiveValue::Set(team_id),
            user_id: ActiveValue::Set(user_id),
            ..Default::default()
        }
    }))
    .exec(db)
    .await?;
    Ok(())
}

async fn load_memberships<C, F>(db: &C, filter: F) -> Result<Vec<Membership>, TeamServiceError>
where
    C: ConnectionTrait,
    F: IntoCondition,
{
    let rows = team_member::Entity::find()
        .filter(filter)
        .find_also_related(user::Entity)
        .order_by_asc(team_member::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(member, user)| {
            // The foreign key guarantees the user exists.
            let user = user?;
            Some(Membership { member, user })
        })
        .collect())
}
