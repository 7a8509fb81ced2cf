use clap::{Parser, Subcommand, ValueEnum};
use nexus::model::entity::{
    Course, CourseCreate, Item, ItemCreate, ItemType, Module, ModuleCreate, PostStatus, UserEntity,
    UserEntityCreate,
};
use nexus::model::{CrudRepository, DbConnection, ModelManager};
use nexus::web::{AuthenticatedUser, UserRole};
use nexus::{Config, error::AppResult};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the course database", long_about = None)]
pub struct Cli {
    /// Database to use instead of `DATABASE_URL` or the config file
    #[arg(long)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons and other course items
    Item {
        #[command(subcommand)]
        action: ItemCommands,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RoleArg {
    Admin,
    Editor,
    Member,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::Editor => UserRole::Editor,
            RoleArg::Member => UserRole::Member,
        }
    }
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value = "member")]
        role: RoleArg,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        #[arg(long)]
        course_id: i64,
        #[arg(long)]
        name: String,
    },
}

/// Item management
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    Add {
        #[arg(long)]
        course_id: i64,
        /// 0 puts the item in the general module
        #[arg(long, default_value_t = 0)]
        module_id: i64,
        #[arg(long)]
        title: String,
        /// video, doc, code, live or text
        #[arg(long, default_value = "text")]
        item_type: ItemType,
        /// Path to an HTML file with the item body
        #[arg(long)]
        file: Option<String>,
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
}

fn status(publish: bool) -> PostStatus {
    if publish { PostStatus::Publish } else { PostStatus::Draft }
}

async fn database_uri(explicit: Option<String>) -> String {
    if let Some(uri) = explicit.or_else(|| std::env::var("DATABASE_URL").ok()) {
        return uri;
    }
    let config = Config::get_or_init(cfg!(debug_assertions)).await;
    config.app().database_uri().to_string()
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = DbConnection::connect(&database_uri(args.database).await)?;
    db_con.migrate().await?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, role } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreate {
                        username,
                        password_hash: nexus::auth::hash_password(&password)?,
                        role: role.into(),
                    },
                )
                .await?;
                println!("User created: {} ({})", user.username(), user.role());
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { title, publish } => {
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        title,
                        status: status(publish),
                        ..Default::default()
                    },
                )
                .await?;
                println!("Course created: #{} {}", course.id(), course.title());
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add { course_id, name } => {
                let module = Module::create(&mm, &actor, ModuleCreate { course_id, name }).await?;
                println!("Module created: #{} {}", module.id(), module.name());
            }
        },

        Commands::Item { action } => match action {
            ItemCommands::Add { course_id, module_id, title, item_type, file, publish } => {
                let content = match file {
                    Some(path) => std::fs::read_to_string(path)?,
                    None => String::new(),
                };
                let item = Item::create(
                    &mm,
                    &actor,
                    ItemCreate {
                        course_id,
                        module_id,
                        title,
                        item_type,
                        status: status(publish),
                        content,
                        excerpt: String::new(),
                        menu_order: None,
                    },
                )
                .await?;
                println!("Item created: #{} {} ({})", item.id(), item.title(), item.item_type().as_str());
            }
        },
    }

    Ok(())
}
