use crate::{
    model::{ModelManager, error::DatabaseResult},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone)]
pub enum ResourceType {
    User,
    Course,
    Module,
    Item,
    Media,
    Completion,
}

pub trait ResourceTyped {
    fn get_resource_type() -> ResourceType;
}

/// CRUD over one table. `Create` and `Update` are separate because updates
/// are partial: absent fields keep their stored value.
#[async_trait::async_trait]
pub trait CrudRepository<T, Create, Update>
where
    T: ResourceTyped,
{
    async fn create(mm: &ModelManager, actor: &AuthenticatedUser, data: Create)
    -> DatabaseResult<T>;

    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: Update,
    ) -> DatabaseResult<T>
    where
        Self: Sized;

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()>
    where
        Self: Sized;

    async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: i64,
    ) -> DatabaseResult<Option<T>>;
}
