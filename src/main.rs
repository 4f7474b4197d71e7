
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use farmdesk::config::{ClientConfig, ConfigError};
use farmdesk::guard::{AccessPolicy, GuardOutcome, RouteGuard};
use farmdesk::navigation::{Navigator, Route};
use farmdesk::net::types::Credentials;
use farmdesk::net::{ApiClient, ApiError, ApiResponse, AuthApi, FarmApi, FarmResource, Scope, Upload};
use farmdesk::routes::{self, Resolution};
use farmdesk::state::{LoginOutcome, SessionStore};
use farmdesk::storage::FileStorage;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("login failed: {0}")]
    LoginFailed(String),
    #[error("access denied; redirected to {0}")]
    Redirected(Route),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("expected a JSON object for --data")]
    NotAnObject,
    #[error("failed to access {path}: {source}")]
    File { path: PathBuf, source: std::io::Error },
}

#[derive(Parser, Debug)]
#[command(name = "farmdesk", about = "Farm management API client")]
struct Cli {
    /// Explicit API base URL; wins over the origin-derived default.
    #[arg(long, env = "FARMDESK_API_URL")]
    api_url: Option<String>,

    /// Page origin the API base URL is derived from.
    #[arg(long, env = "FARMDESK_ORIGIN")]
    origin: Option<String>,

    #[arg(long, env = "FARMDESK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "FARMDESK_PASSWORD")]
        password: String,
    },
    Logout,
    Whoami,
    /// Show what a frontend path renders for the current session.
    Route {
        path: String,
    },
    Profile(ProfileCommand),
    Users(UsersCommand),
    Farms(FarmsCommand),
    /// Records across every farm the user can see.
    Records {
        resource: FarmResource,
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Records scoped to one farm.
    Farm {
        farm_id: u64,
        resource: FarmResource,
        #[command(subcommand)]
        action: RecordAction,
    },
    CropStages(CropStagesCommand),
    IssueReports(IssueReportsCommand),
    Fertigation(FertigationCommand),
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        data: String,
    },
    ChangePassword {
        #[arg(long, env = "FARMDESK_PASSWORD")]
        current: String,
        #[arg(long)]
        new: String,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Show {
        user_id: u64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        user_id: u64,
        #[arg(long)]
        data: String,
    },
    Delete {
        user_id: u64,
    },
    /// Every account, staff included.
    All,
    Admins,
    CreateAdmin {
        #[arg(long)]
        data: String,
    },
    ResetPassword {
        user_id: u64,
        #[arg(long)]
        new: String,
    },
}

#[derive(Args, Debug)]
struct FarmsCommand {
    #[command(subcommand)]
    command: FarmsSubcommand,
}

#[derive(Subcommand, Debug)]
enum FarmsSubcommand {
    List,
    Show {
        farm_id: u64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        farm_id: u64,
        #[arg(long)]
        data: String,
    },
    Delete {
        farm_id: u64,
    },
    Mine,
    /// Summary across the farms assigned to the current farm user.
    Overview,
    Dashboard {
        farm_id: u64,
    },
    WorkerSummary,
    MyNotifications {
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    AdminNotifications,
    Notify {
        #[arg(long)]
        data: String,
    },
}

#[derive(Subcommand, Debug)]
enum RecordAction {
    List {
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    Show {
        id: u64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: u64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: u64,
    },
    Analytics {
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Notifications only.
    MarkRead {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Notifications only, across all farms; `--data` selects what to delete.
    DeleteMany {
        #[arg(long)]
        data: String,
    },
}

#[derive(Args, Debug)]
struct CropStagesCommand {
    #[command(subcommand)]
    command: CropStagesSubcommand,
}

#[derive(Subcommand, Debug)]
enum CropStagesSubcommand {
    Import {
        file: PathBuf,
    },
    Export {
        #[arg(long, default_value = "crop_stages_export.csv")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct IssueReportsCommand {
    #[command(subcommand)]
    command: IssueReportsSubcommand,
}

#[derive(Subcommand, Debug)]
enum IssueReportsSubcommand {
    Create {
        #[arg(long)]
        farm: Option<u64>,
        #[arg(long)]
        data: String,
        #[arg(long)]
        photo: Option<PathBuf>,
        #[arg(long)]
        photo_mime: Option<String>,
    },
}

#[derive(Args, Debug)]
struct FertigationCommand {
    #[command(subcommand)]
    command: FertigationSubcommand,
}

#[derive(Subcommand, Debug)]
enum FertigationSubcommand {
    Schedule {
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    CreateSchedule {
        #[arg(long)]
        data: String,
    },
}

impl Command {
    /// Policy of the view the command stands in for. `None` runs signed out.
    fn policy(&self) -> Option<AccessPolicy> {
        use AccessPolicy::{AdminOrSuperuser, AnyAuthenticated, FarmUserOnly, SuperuserOnly};

        match self {
            Self::Login { .. } | Self::Logout | Self::Route { .. } => None,
            Self::Whoami
            | Self::Profile(_)
            | Self::Records { .. }
            | Self::CropStages(_)
            | Self::Fertigation(_)
            | Self::IssueReports(IssueReportsCommand { command: IssueReportsSubcommand::Create { farm: None, .. } }) => {
                Some(AnyAuthenticated)
            }
            Self::IssueReports(_) | Self::Farm { .. } => Some(FarmUserOnly),
            Self::Users(users) => Some(match users.command {
                UsersSubcommand::All
                | UsersSubcommand::Admins
                | UsersSubcommand::CreateAdmin { .. }
                | UsersSubcommand::ResetPassword { .. } => SuperuserOnly,
                _ => AdminOrSuperuser,
            }),
            Self::Farms(farms) => Some(match farms.command {
                FarmsSubcommand::List
                | FarmsSubcommand::Show { .. }
                | FarmsSubcommand::WorkerSummary
                | FarmsSubcommand::MyNotifications { .. } => AnyAuthenticated,
                FarmsSubcommand::Mine | FarmsSubcommand::Overview | FarmsSubcommand::Dashboard { .. } => FarmUserOnly,
                _ => AdminOrSuperuser,
            }),
        }
    }
}

/// The terminal has no page to reload; tell the user to sign in again.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn hard_redirect(&self, route: Route) {
        tracing::warn!(%route, "session ended by the backend");
        eprintln!("session expired; run `farmdesk login` to sign in again");
    }
}

struct App {
    session: Arc<SessionStore>,
    auth: AuthApi,
    farms: FarmApi,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = ClientConfig::resolve(cli.api_url.as_deref(), cli.origin.as_deref(), cli.session_file)?;
    tracing::debug!(base_url = %config.base_url, session_file = %config.session_file.display(), "config resolved");

    let storage = Arc::new(FileStorage::new(config.session_file));
    let client = Arc::new(ApiClient::new(config.base_url, storage));
    let app = App {
        session: SessionStore::new(Arc::clone(&client), Arc::new(TerminalNavigator)),
        auth: AuthApi::new(Arc::clone(&client)),
        farms: FarmApi::new(client),
    };
    app.session.restore();

    authorize(&app.session, cli.command.policy()).await?;

    match cli.command {
        Command::Login { username, password } => run_login(&app, username, password).await,
        Command::Logout => {
            app.session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => print_json(&whoami(&app.session)),
        Command::Route { path } => run_route(&app, &path),
        Command::Profile(profile) => run_profile(&app, profile.command).await,
        Command::Users(users) => run_users(&app, users.command).await,
        Command::Farms(farms) => run_farms(&app, farms.command).await,
        Command::Records { resource, action } => run_records(&app, Scope::Global, resource, action).await,
        Command::Farm { farm_id, resource, action } => run_records(&app, Scope::Farm(farm_id), resource, action).await,
        Command::CropStages(crop) => run_crop_stages(&app, crop.command).await,
        Command::IssueReports(reports) => run_issue_reports(&app, reports.command).await,
        Command::Fertigation(fertigation) => run_fertigation(&app, fertigation.command).await,
    }
}

async fn authorize(session: &SessionStore, policy: Option<AccessPolicy>) -> Result<(), CliError> {
    let Some(policy) = policy else {
        return Ok(());
    };
    let mut receiver = session.subscribe();
    match RouteGuard::new(policy).settle(&mut receiver).await {
        GuardOutcome::Render => Ok(()),
        GuardOutcome::Redirect(route) => Err(CliError::Redirected(route)),
        // Only reachable if the store vanished before restoring.
        GuardOutcome::Loading => Err(CliError::Redirected(Route::Login)),
    }
}

// =============================================================================
// SESSION
// =============================================================================

async fn run_login(app: &App, username: String, password: String) -> Result<(), CliError> {
    match app.session.login(&Credentials::new(username, password)).await {
        LoginOutcome::Success(identity) => {
            let caps = app.session.capabilities();
            let landing = if caps.is_farm_user { Route::FarmUserDashboard } else { Route::Dashboard };
            println!("logged in as {} ({landing})", identity.display_name());
            Ok(())
        }
        LoginOutcome::Failure { message } => Err(CliError::LoginFailed(message)),
    }
}

fn whoami(session: &SessionStore) -> Value {
    let caps = session.capabilities();
    json!({
        "identity": session.identity(),
        "can_manage_users": caps.can_manage_users(),
        "can_manage_farm_users": caps.can_manage_farm_users(),
        "can_manage_farms": caps.can_manage_farms(),
    })
}

fn run_route(app: &App, path: &str) -> Result<(), CliError> {
    let state = app.session.state();
    let rendered = match routes::resolve(path) {
        Resolution::Matched(matched) => json!({
            "pattern": matched.route.pattern,
            "farm_id": matched.farm_id,
            "outcome": describe(matched.outcome(&state)),
        }),
        Resolution::Fallback(route) => json!({ "pattern": null, "farm_id": null, "outcome": describe(GuardOutcome::Redirect(route)) }),
    };
    print_json(&rendered)
}

fn describe(outcome: GuardOutcome) -> Value {
    match outcome {
        GuardOutcome::Loading => json!("loading"),
        GuardOutcome::Render => json!("render"),
        GuardOutcome::Redirect(route) => json!({ "redirect": route.path() }),
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

async fn run_profile(app: &App, command: ProfileSubcommand) -> Result<(), CliError> {
    let response = match command {
        ProfileSubcommand::Show => app.auth.profile().await?,
        ProfileSubcommand::Update { data } => app.auth.update_profile(parse_data(&data)?).await?,
        ProfileSubcommand::ChangePassword { current, new } => {
            app.auth.change_password(json!({ "current_password": current, "new_password": new })).await?
        }
    };
    print_response(&response)
}

async fn run_users(app: &App, command: UsersSubcommand) -> Result<(), CliError> {
    let response = match command {
        UsersSubcommand::List => app.auth.farm_users().await?,
        UsersSubcommand::Show { user_id } => app.auth.farm_user(user_id).await?,
        UsersSubcommand::Create { data } => app.auth.create_farm_user(parse_data(&data)?).await?,
        UsersSubcommand::Update { user_id, data } => app.auth.update_farm_user(user_id, parse_data(&data)?).await?,
        UsersSubcommand::Delete { user_id } => app.auth.delete_farm_user(user_id).await?,
        UsersSubcommand::All => app.auth.all_users().await?,
        UsersSubcommand::Admins => app.auth.admins().await?,
        UsersSubcommand::CreateAdmin { data } => app.auth.create_admin(parse_data(&data)?).await?,
        UsersSubcommand::ResetPassword { user_id, new } => {
            app.auth.reset_user_password(user_id, json!({ "new_password": new })).await?
        }
    };
    print_response(&response)
}

// =============================================================================
// FARMS AND RECORDS
// =============================================================================

async fn run_farms(app: &App, command: FarmsSubcommand) -> Result<(), CliError> {
    let response = match command {
        FarmsSubcommand::List => app.farms.list_farms().await?,
        FarmsSubcommand::Show { farm_id } => app.farms.farm(farm_id).await?,
        FarmsSubcommand::Create { data } => app.farms.create_farm(parse_data(&data)?).await?,
        FarmsSubcommand::Update { farm_id, data } => app.farms.update_farm(farm_id, parse_data(&data)?).await?,
        FarmsSubcommand::Delete { farm_id } => app.farms.delete_farm(farm_id).await?,
        FarmsSubcommand::Mine => app.farms.my_farms().await?,
        FarmsSubcommand::Overview => app.farms.farm_user_dashboard().await?,
        FarmsSubcommand::Dashboard { farm_id } => app.farms.farm_dashboard(farm_id).await?,
        FarmsSubcommand::WorkerSummary => app.farms.worker_dashboard_summary().await?,
        FarmsSubcommand::MyNotifications { params } => app.farms.my_notifications(params).await?,
        FarmsSubcommand::AdminNotifications => app.farms.admin_notifications().await?,
        FarmsSubcommand::Notify { data } => app.farms.send_admin_notification(parse_data(&data)?).await?,
    };
    print_response(&response)
}

async fn run_records(app: &App, scope: Scope, resource: FarmResource, action: RecordAction) -> Result<(), CliError> {
    let response = match action {
        RecordAction::List { params } => app.farms.list(scope, resource, params).await?,
        RecordAction::Show { id } => app.farms.get(scope, resource, id).await?,
        RecordAction::Create { data } => app.farms.create(scope, resource, parse_data(&data)?).await?,
        RecordAction::Update { id, data } => app.farms.update(scope, resource, id, parse_data(&data)?).await?,
        RecordAction::Delete { id } => app.farms.delete(scope, resource, id).await?,
        RecordAction::Analytics { params } => {
            if matches!(scope, Scope::Farm(_)) {
                return Err(unsupported("farm-scoped analytics", resource));
            }
            app.farms.analytics(resource, params).await?
        }
        RecordAction::MarkRead { ids } => {
            require_notifications("mark-read", resource)?;
            app.farms.mark_notifications_read(scope, &ids).await?
        }
        RecordAction::DeleteMany { data } => {
            require_notifications("delete-many", resource)?;
            // The bulk endpoint spans every farm; an empty selection deletes all.
            if matches!(scope, Scope::Farm(_)) {
                return Err(unsupported("farm-scoped delete-many", resource));
            }
            app.farms.delete_notifications(parse_data(&data)?).await?
        }
    };
    print_response(&response)
}

fn require_notifications(operation: &'static str, resource: FarmResource) -> Result<(), CliError> {
    if matches!(resource, FarmResource::Notifications) {
        Ok(())
    } else {
        Err(unsupported(operation, resource))
    }
}

fn unsupported(operation: &'static str, resource: FarmResource) -> CliError {
    CliError::Api(ApiError::Unsupported { operation, resource: resource.segment() })
}

async fn run_crop_stages(app: &App, command: CropStagesSubcommand) -> Result<(), CliError> {
    match command {
        CropStagesSubcommand::Import { file } => {
            let upload = read_upload(&file, None).await?;
            let response = app.farms.import_crop_stages(upload).await?;
            print_response(&response)
        }
        CropStagesSubcommand::Export { output } => {
            let bytes = app.farms.export_crop_stages().await?;
            tokio::fs::write(&output, &bytes).await.map_err(|source| CliError::File { path: output.clone(), source })?;
            println!("wrote {} bytes to {}", bytes.len(), output.display());
            Ok(())
        }
    }
}

async fn run_issue_reports(app: &App, command: IssueReportsSubcommand) -> Result<(), CliError> {
    match command {
        IssueReportsSubcommand::Create { farm, data, photo, photo_mime } => {
            let scope = farm.map_or(Scope::Global, Scope::Farm);
            let fields = parse_object(&data)?;
            let photo = match photo {
                Some(path) => Some(read_upload(&path, photo_mime).await?),
                None => None,
            };
            let response = app.farms.create_issue_report(scope, &fields, photo).await?;
            print_response(&response)
        }
    }
}

async fn run_fertigation(app: &App, command: FertigationSubcommand) -> Result<(), CliError> {
    let response = match command {
        FertigationSubcommand::Schedule { params } => app.farms.fertigation_schedule(params).await?,
        FertigationSubcommand::CreateSchedule { data } => app.farms.create_fertigation_schedule(parse_data(&data)?).await?,
    };
    print_response(&response)
}

// =============================================================================
// HELPERS
// =============================================================================

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn parse_data(raw: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str(raw)?)
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, CliError> {
    match parse_data(raw)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(CliError::NotAnObject),
    }
}

async fn read_upload(path: &Path, mime: Option<String>) -> Result<Upload, CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::File { path: path.to_owned(), source })?;
    let file_name = path.file_name().map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned());
    Ok(Upload { file_name, bytes, mime })
}

fn print_response(response: &ApiResponse) -> Result<(), CliError> {
    print_json(&response.value()?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
