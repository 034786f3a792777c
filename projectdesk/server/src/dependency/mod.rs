use crate::entities::*;
use sea_orm::*;
use std::collections::HashMap;

pub mod api;
pub mod graph;

pub use graph::{CycleDetected, DependencyGraph};

/// A dependency edge together with the task it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    id: i32,
    task_id: i32,
    depends_on: i32,
    depends: task::Model,
}

impl Dependency {
    pub fn new(edge: task_dependency::Model, depends: task::Model) -> Self {
        Self {
            id: edge.id,
            task_id: edge.task_id,
            depends_on: edge.depends_on,
            depends,
        }
    }

    /// Returns the ID of the edge.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the ID of the waiting task.
    pub fn task_id(&self) -> i32 {
        self.task_id
    }

    /// Returns the ID of the task that has to be completed first.
    pub fn depends_on(&self) -> i32 {
        self.depends_on
    }

    /// Returns the task that has to be completed first.
    pub fn depends(&self) -> &task::Model {
        &self.depends
    }

    pub fn into_depends(self) -> task::Model {
        self.depends
    }
}

/// Error type for DependencyService operations.
#[derive(Debug, thiserror::Error)]
pub enum DependencyServiceError {
    #[error("dependsOn is required")]
    MissingDependsOn,
    #[error("Dependency id required")]
    MissingDependencyId,
    #[error("Task {0} cannot depend on itself")]
    SelfDependency(i32),
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("Task {task_id} and task {depends_on} belong to different projects")]
    CrossProject { task_id: i32, depends_on: i32 },
    #[error("Task {task_id} already depends on task {depends_on}")]
    DuplicateDependency { task_id: i32, depends_on: i32 },
    #[error("Task {task_id} cannot depend on task {depends_on}: it would create a dependency cycle")]
    Cycle { task_id: i32, depends_on: i32 },
    #[error("Dependency with ID {0} not found")]
    DependencyNotFound(i32),
    #[error("Project {project_id} has inconsistent dependencies: {source}")]
    CorruptGraph {
        project_id: i32,
        source: CycleDetected,
    },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct DependencyService<'a> {
    db: &'a DatabaseConnection,
}

impl DependencyService<'_> {
    pub fn new(db: &DatabaseConnection) -> DependencyService<'_> {
        DependencyService { db }
    }

    /// Lists every edge whose source is `task_id`, ordered by edge id.
    ///
    /// An unknown task simply has no dependencies.
    #[tracing::instrument(skip(self))]
    pub async fn list_dependencies(
        &self,
        task_id: i32,
    ) -> Result<Vec<Dependency>, DependencyServiceError> {
        let edges = task_dependency::Entity::find()
            .filter(task_dependency::Column::TaskId.eq(task_id))
            .order_by_asc(task_dependency::Column::Id)
            .all(self.db)
            .await?;
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let target_ids: Vec<i32> = edges.iter().map(|edge| edge.depends_on).collect();
        let mut targets: HashMap<i32, task::Model> = task::Entity::find()
            .filter(task::Column::Id.is_in(target_ids))
            .all(self.db)
            .await?
            .into_iter()
            .map(|model| (model.id, model))
            .collect();

        let mut dependencies = Vec::with_capacity(edges.len());
        for edge in edges {
            // The foreign key guarantees the target exists.
            let Some(target) = targets.remove(&edge.depends_on) else {
                tracing::warn!("Dependency {} points at missing task {}", edge.id, edge.depends_on);
                continue;
            };
            dependencies.push(Dependency::new(edge, target));
        }
        Ok(dependencies)
    }

    /// Creates the edge `task_id -> depends_on`.
    ///
    /// Both tasks must exist and belong to the same project, and the new edge
    /// must not close a cycle. The checks and the insert share one transaction
    /// that holds a row lock on the project, so concurrent insertions into the
    /// same project cannot together form a cycle.
    #[tracing::instrument(skip(self))]
    pub async fn add_dependency(
        &self,
        task_id: i32,
        depends_on: Option<i32>,
    ) -> Result<Dependency, DependencyServiceError> {
        let depends_on = depends_on.ok_or(DependencyServiceError::MissingDependsOn)?;
        if task_id == depends_on {
            return Err(DependencyServiceError::SelfDependency(task_id));
        }

        let txn = self.db.begin().await?;

        let source = find_task(&txn, task_id).await?;
        let target = find_task(&txn, depends_on).await?;
        if source.project_id != target.project_id {
            return Err(DependencyServiceError::CrossProject {
                task_id,
                depends_on,
            });
        }

        project::Entity::find_by_id(source.project_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(DependencyServiceError::ProjectNotFound(source.project_id))?;

        let graph = load_project_graph(&txn, source.project_id).await?;
        if graph.contains_edge(task_id, depends_on) {
            return Err(DependencyServiceError::DuplicateDependency {
                task_id,
                depends_on,
            });
        }
        if graph.would_create_cycle(task_id, depends_on) {
            tracing::info!(
                "Rejected dependency {} -> {}: cycle in project {}",
                task_id,
                depends_on,
                source.project_id
            );
            return Err(DependencyServiceError::Cycle {
                task_id,
                depends_on,
            });
        }

        let edge = task_dependency::ActiveModel {
            task_id: ActiveValue::Set(task_id),
            depends_on: ActiveValue::Set(depends_on),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        Ok(Dependency::new(edge, target))
    }

    /// Deletes the edge `dependency_id` whose source is `task_id`.
    #[tracing::instrument(skip(self))]
    pub async fn remove_dependency(
        &self,
        task_id: i32,
        dependency_id: Option<i32>,
    ) -> Result<(), DependencyServiceError> {
        let dependency_id = dependency_id.ok_or(DependencyServiceError::MissingDependencyId)?;

        let result = task_dependency::Entity::delete_many()
            .filter(task_dependency::Column::Id.eq(dependency_id))
            .filter(task_dependency::Column::TaskId.eq(task_id))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DependencyServiceError::DependencyNotFound(dependency_id));
        }
        Ok(())
    }

    /// Loads the dependency graph of every task in `project_id`.
    #[tracing::instrument(skip(self))]
    pub async fn project_graph(
        &self,
        project_id: i32,
    ) -> Result<DependencyGraph, DependencyServiceError> {
        load_project_graph(self.db, project_id).await
    }

    /// Returns the ids of the project's tasks with every dependency ahead of its dependents.
    #[tracing::instrument(skip(self))]
    pub async fn dependency_order(&self, project_id: i32) -> Result<Vec<i32>, DependencyServiceError> {
        project::Entity::find_by_id(project_id)
            .one(self.db)
            .await?
            .ok_or(DependencyServiceError::ProjectNotFound(project_id))?;

        let graph = load_project_graph(self.db, project_id).await?;
        graph
            .topological_order()
            .map_err(|source| DependencyServiceError::CorruptGraph { project_id, source })
    }
}

async fn find_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
) -> Result<task::Model, DependencyServiceError> {
    task::Entity::find_by_id(task_id)
        .one(conn)
        .await?
        .ok_or(DependencyServiceError::TaskNotFound(task_id))
}

async fn load_project_graph<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
) -> Result<DependencyGraph, DependencyServiceError> {
    let task_ids: Vec<i32> = task::Entity::find()
        .select_only()
        .column(task::Column::Id)
        .filter(task::Column::ProjectId.eq(project_id))
        .into_tuple()
        .all(conn)
        .await?;
    if task_ids.is_empty() {
        return Ok(DependencyGraph::new());
    }

    let edges = task_dependency::Entity::find()
        .filter(task_dependency::Column::TaskId.is_in(task_ids.iter().copied()))
        .all(conn)
        .await?;

    let mut graph = DependencyGraph::from_edges(edges.iter().map(|e| (e.task_id, e.depends_on)));
    for task_id in task_ids {
        graph.add_task(task_id);
    }
    Ok(graph)
}

/// Removes every edge touching `task_id`, as source or as target.
pub(crate) async fn delete_edges_of_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
) -> Result<u64, DbErr> {
    let result = task_dependency::Entity::delete_many()
        .filter(
            Condition::any()
                .add(task_dependency::Column::TaskId.eq(task_id))
                .add(task_dependency::Column::DependsOn.eq(task_id)),
        )
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Counts the edges touching `task_id`, as source or as target.
pub(crate) async fn count_edges_of_task<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
) -> Result<u64, DbErr> {
    task_dependency::Entity::find()
        .filter(
            Condition::any()
                .add(task_dependency::Column::TaskId.eq(task_id))
                .add(task_dependency::Column::DependsOn.eq(task_id)),
        )
        .count(conn)
        .await
}
