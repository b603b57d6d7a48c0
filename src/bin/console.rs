use std::{error::Error, num::NonZeroUsize, path::PathBuf, process::exit};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use admin_console::{
    AppConfig, AppState, DEFAULT_API_BASE_URL, Entity, EntityId, IdStrategy, Language,
    PaginationConfig, PaginationIndicator, SortDirection, Store, Theme,
    models::{Credentials, SignUp, Subcategory},
};

/// A command line console for the admin REST API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the REST API.
    #[arg(long, env = "ADMIN_API_URL", default_value = DEFAULT_API_BASE_URL)]
    api_url: String,

    /// File path to the SQLite database used as the local cache. The cache
    /// is kept in memory if this is not set.
    #[arg(long, env = "ADMIN_STORAGE_PATH")]
    storage_path: Option<PathBuf>,

    /// The number of rows shown per page.
    #[arg(long, env = "ADMIN_PAGE_SIZE", default_value_t = NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN))]
    page_size: NonZeroUsize,

    /// Give new records sequential IDs instead of timestamps.
    #[arg(long)]
    sequential_ids: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a page of records.
    List(ListArgs),

    /// Add a record given as JSON.
    Add {
        /// The collection to add to.
        collection: Collection,
        /// The record as a JSON object.
        json: String,
    },

    /// Replace the record with the same ID as the one given as JSON.
    Update {
        /// The collection to update.
        collection: Collection,
        /// The record as a JSON object, including its ID.
        json: String,
    },

    /// Delete a record.
    Delete {
        /// The collection to delete from.
        collection: Collection,
        /// The ID of the record.
        id: EntityId,
    },

    /// Log in and remember the session.
    LogIn {
        /// The email address of the account.
        #[arg(long)]
        email: String,
        /// The password of the account.
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account.
    SignUp {
        /// The display name.
        #[arg(long)]
        name: String,
        /// The email address.
        #[arg(long)]
        email: String,
        /// The password.
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        /// A URL for the avatar image.
        #[arg(long, default_value = "")]
        avatar: String,
    },

    /// Forget the current session.
    LogOut,

    /// Show the logged in user.
    Whoami,

    /// Show or change the colour theme.
    Theme {
        /// The new theme: light, dark or system.
        value: Option<Theme>,
    },

    /// Show or change the interface language.
    Lang {
        /// The new language: en or fr.
        value: Option<Language>,
    },
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// The collection to list.
    collection: Collection,

    /// Only show records containing this text.
    #[arg(short, long, default_value = "")]
    search: String,

    /// The field to sort by, e.g. "officeName".
    #[arg(long)]
    sort: Option<String>,

    /// The sort direction.
    #[arg(long, default_value_t = SortDirection::Asc)]
    direction: SortDirection,

    /// The page to show, starting from 1.
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Fetch from the API even if the collection is cached.
    #[arg(long)]
    refresh: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Collection {
    Users,
    Pincodes,
    Categories,
    Subcategories,
    ServiceProviders,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let config = AppConfig {
        api_base_url: args.api_url,
        storage_path: args.storage_path,
        pagination: PaginationConfig {
            default_page_size: args.page_size,
            ..PaginationConfig::default()
        },
        id_strategy: if args.sequential_ids {
            IdStrategy::Sequential
        } else {
            IdStrategy::Timestamp
        },
        ..AppConfig::default()
    };

    let storage = config.open_storage()?;
    let state = AppState::new(&config, storage)?;
    state.auth.restore();

    if let Err(error) = run(&state, args.command).await {
        print_error(error.as_ref());
        exit(1);
    }

    Ok(())
}

async fn run(state: &AppState, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List(list_args) => match list_args.collection {
            Collection::Users => list(&state.users, &list_args).await,
            Collection::Pincodes => list(&state.pincodes, &list_args).await,
            Collection::Categories => list(&state.categories, &list_args).await,
            Collection::Subcategories => list(&state.subcategories, &list_args).await,
            Collection::ServiceProviders => list(&state.service_providers, &list_args).await,
        },
        Command::Add { collection, json } => match collection {
            Collection::Users => add(&state.users, &json).await,
            Collection::Pincodes => add(&state.pincodes, &json).await,
            Collection::Categories => add(&state.categories, &json).await,
            Collection::Subcategories => {
                state.subcategories.load().await?;
                let subcategory: Subcategory = serde_json::from_str(&json)?;
                print_json(&state.add_subcategory(subcategory).await?)
            }
            Collection::ServiceProviders => add(&state.service_providers, &json).await,
        },
        Command::Update { collection, json } => match collection {
            Collection::Users => update(&state.users, &json).await,
            Collection::Pincodes => update(&state.pincodes, &json).await,
            Collection::Categories => update(&state.categories, &json).await,
            Collection::Subcategories => {
                state.subcategories.load().await?;
                let subcategory: Subcategory = serde_json::from_str(&json)?;
                report_update(state.update_subcategory(subcategory).await?);
                Ok(())
            }
            Collection::ServiceProviders => update(&state.service_providers, &json).await,
        },
        Command::Delete { collection, id } => match collection {
            Collection::Users => delete(&state.users, &id).await,
            Collection::Pincodes => delete(&state.pincodes, &id).await,
            Collection::Categories => delete(&state.categories, &id).await,
            Collection::Subcategories => delete(&state.subcategories, &id).await,
            Collection::ServiceProviders => delete(&state.service_providers, &id).await,
        },
        Command::LogIn { email, password } => {
            let session = state.auth.log_in(&Credentials { email, password }).await?;
            println!("Logged in as {} <{}>", session.user.name, session.user.email);
            Ok(())
        }
        Command::SignUp {
            name,
            email,
            password,
            avatar,
        } => {
            let sign_up = SignUp {
                name,
                email,
                password,
                avatar,
            };
            let user = state.auth.sign_up(&sign_up).await?;
            println!("Created an account for {}, log in to continue", user.email);
            Ok(())
        }
        Command::LogOut => {
            state.auth.log_out();
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            match state.auth.user() {
                Some(user) => println!("{} <{}> (ID {})", user.name, user.email, user.id),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Theme { value } => {
            if let Some(theme) = value {
                state.preferences.set_theme(theme)?;
            }
            println!("{}", state.preferences.theme());
            Ok(())
        }
        Command::Lang { value } => {
            if let Some(language) = value {
                state.preferences.set_language(language)?;
            }
            println!("{}", state.preferences.language());
            Ok(())
        }
    }
}

async fn list<E: Entity>(store: &Store<E>, args: &ListArgs) -> Result<(), Box<dyn Error>> {
    if args.refresh {
        store.refresh().await?;
    } else {
        store.load().await?;
    }

    store.set_search_query(args.search.as_str());
    if let Some(field) = &args.sort {
        store.sort_column(field.as_str(), args.direction);
    }
    store.set_page(args.page);

    for entity in store.paginated() {
        print_json(&entity)?;
    }

    let total_pages = store.total_pages();
    if total_pages == 0 {
        println!("No {} found", E::PLURAL_NAME);
    } else {
        println!(
            "Page {} of {total_pages}  {}",
            store.current_page(),
            render_indicators(&store.page_indicators())
        );
    }

    Ok(())
}

async fn add<E: Entity>(store: &Store<E>, json: &str) -> Result<(), Box<dyn Error>> {
    store.load().await?;
    let entity: E = serde_json::from_str(json)?;

    print_json(&store.add(entity)?)
}

async fn update<E: Entity>(store: &Store<E>, json: &str) -> Result<(), Box<dyn Error>> {
    store.load().await?;
    let entity: E = serde_json::from_str(json)?;

    report_update(store.update(entity)?);
    Ok(())
}

async fn delete<E: Entity>(store: &Store<E>, id: &EntityId) -> Result<(), Box<dyn Error>> {
    store.load().await?;

    if store.delete(id)? {
        println!("Deleted {id}");
    } else {
        println!("Nothing to delete: no record has the ID {id}");
    }

    Ok(())
}

fn report_update(updated: bool) {
    if updated {
        println!("Updated");
    } else {
        println!("Nothing to update: no record has that ID");
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn render_indicators(indicators: &[PaginationIndicator]) -> String {
    indicators
        .iter()
        .map(|indicator| match indicator {
            PaginationIndicator::Page(page) => page.to_string(),
            PaginationIndicator::CurrPage(page) => format!("[{page}]"),
            PaginationIndicator::Ellipsis => "...".to_owned(),
            PaginationIndicator::BackButton(_) => "<".to_owned(),
            PaginationIndicator::NextButton(_) => ">".to_owned(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn print_error(error: &dyn Error) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
