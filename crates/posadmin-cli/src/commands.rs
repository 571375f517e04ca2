//! CLI commands

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use tracing::{debug, warn};

use posadmin_core::auth::open_store;
use posadmin_core::models::{Cliente, Producto, Venta};
use posadmin_core::utils::{cmp_ignore_case, format_money, truncate};
use posadmin_core::{ApiClient, AuthSession, Config, DashboardStats, TagBoard};

/// Read the password from here instead of prompting
const ENV_PASSWORD: &str = "POSADMIN_PASSWORD";

/// Keychain account used before anyone has logged in
const DEFAULT_ACCOUNT: &str = "default";

const NAME_WIDTH: usize = 28;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the token pair
    Login {
        /// Account email (defaults to the last one used)
        email: Option<String>,
    },

    /// Forget the stored tokens
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List clients
    Clientes {
        /// Search by name, email or phone
        query: Option<String>,
    },

    /// List products
    Productos {
        /// Search by name, barcode or category
        query: Option<String>,

        /// Only products at or below their reorder threshold
        #[arg(long)]
        bajo_stock: bool,
    },

    /// List sales
    Ventas {
        /// Only sales on this day (YYYY-MM-DD)
        #[arg(long)]
        fecha: Option<String>,
    },

    /// Summary figures for today
    Dashboard,

    /// Message board tags, visible first
    Tags,
}

impl Commands {
    pub async fn execute(self, config: Config, json: bool) -> Result<()> {
        match self {
            Commands::Login { email } => login(config, email).await,
            Commands::Logout => {
                session(&config, None)?.logout()?;
                println!("Logged out");
                Ok(())
            }
            Commands::Whoami => whoami(&config, json).await,
            Commands::Clientes { query } => clientes(&config, query.as_deref(), json).await,
            Commands::Productos { query, bajo_stock } => {
                productos(&config, query.as_deref(), bajo_stock, json).await
            }
            Commands::Ventas { fecha } => ventas(&config, fecha.as_deref(), json).await,
            Commands::Dashboard => dashboard(&config, json).await,
            Commands::Tags => tags(&config, json).await,
        }
    }
}

/// Build a session against the configured backend and token store.
/// `account` selects the keychain entry; other stores ignore it.
fn session(config: &Config, account: Option<&str>) -> Result<AuthSession> {
    let account = account
        .or(config.last_email.as_deref())
        .unwrap_or(DEFAULT_ACCOUNT);
    let store = open_store(config.token_storage, &config.cache_dir()?, account)?;
    let api = ApiClient::builder()
        .base_url(config.api_url())
        .timeout(config.request_timeout())
        .token_store(store)
        .build()
        .context("Failed to create HTTP client")?;
    Ok(AuthSession::new(api))
}

/// Session for commands that need a stored token
fn logged_in(config: &Config) -> Result<AuthSession> {
    let session = session(config, None)?;
    if !session.is_authenticated() {
        anyhow::bail!("Not logged in. Run `posadmin login` first.");
    }
    Ok(session)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

fn read_password() -> Result<String> {
    match std::env::var(ENV_PASSWORD) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => Ok(rpassword::prompt_password("Password: ")?),
    }
}

async fn login(mut config: Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt_email()?,
    };
    let email = AuthSession::normalize_email(&email);
    if email.is_empty() {
        anyhow::bail!("Email required");
    }
    let password = read_password()?;

    let session = session(&config, Some(&email))?;
    session.login(&email, &password).await?;

    config.last_email = Some(email.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    match session.current_user().await {
        Ok(Some(user)) => println!("Logged in as {}", user.display_name()),
        Ok(None) | Err(_) => println!("Logged in as {}", email),
    }
    Ok(())
}

async fn whoami(config: &Config, json: bool) -> Result<()> {
    let session = session(config, None)?;
    let Some(user) = session.current_user().await? else {
        println!("Not logged in");
        return Ok(());
    };
    if json {
        return print_json(&user);
    }
    println!("{} <{}>", user.display_name(), user.email);
    println!("Usuario: {}", user.nombre_usuario);
    println!("Admin:   {}", if user.is_admin() { "sí" } else { "no" });
    Ok(())
}

async fn clientes(config: &Config, query: Option<&str>, json: bool) -> Result<()> {
    let api = logged_in(config)?.api().clone();
    let query = query.unwrap_or_default();
    let mut clientes: Vec<Cliente> = api.fetch_clientes(query).await?;
    // The backend may ignore `q`; filter again locally
    clientes.retain(|c| c.matches(query));
    clientes.sort_by(|a, b| cmp_ignore_case(&a.full_name(), &b.full_name()));
    debug!(count = clientes.len(), "Clients listed");

    if json {
        return print_json(&clientes);
    }
    for c in &clientes {
        println!(
            "{:>5}  {:<width$}  {:<30}  {}",
            c.id_cliente.map(|id| id.to_string()).unwrap_or_default(),
            truncate(&c.full_name(), NAME_WIDTH),
            truncate(&c.email, 30),
            c.phone_display(),
            width = NAME_WIDTH,
        );
    }
    println!("{} clientes", clientes.len());
    Ok(())
}

async fn productos(config: &Config, query: Option<&str>, bajo_stock: bool, json: bool) -> Result<()> {
    let api = logged_in(config)?.api().clone();
    let query = query.unwrap_or_default();
    let mut productos: Vec<Producto> = api.fetch_productos(query).await?;
    productos.retain(|p| p.matches(query) && (!bajo_stock || p.necesita_reposicion()));

    if json {
        return print_json(&productos);
    }
    for p in &productos {
        println!(
            "{:>5}  {:<width$}  {:>12}  {:>5}{}",
            p.id_producto.map(|id| id.to_string()).unwrap_or_default(),
            truncate(&p.nombre, NAME_WIDTH),
            format_money(p.precio),
            p.stock,
            if p.necesita_reposicion() { "  (reponer)" } else { "" },
            width = NAME_WIDTH,
        );
    }
    println!("{} productos", productos.len());
    Ok(())
}

async fn ventas(config: &Config, fecha: Option<&str>, json: bool) -> Result<()> {
    let api = logged_in(config)?.api().clone();
    let ventas: Vec<Venta> = api.fetch_ventas(fecha.unwrap_or_default()).await?;

    if json {
        return print_json(&ventas);
    }
    for v in &ventas {
        println!(
            "{:>5}  {}  {:<width$}  {:<13}  {:>12}{}",
            v.id_venta,
            v.fecha,
            truncate(&v.cliente_display(), NAME_WIDTH),
            v.metodo_pago.label(),
            format_money(v.total),
            if v.is_cancelled() { "  (cancelada)" } else { "" },
            width = NAME_WIDTH,
        );
    }
    println!("{} ventas", ventas.len());
    Ok(())
}

async fn dashboard(config: &Config, json: bool) -> Result<()> {
    let api = logged_in(config)?.api().clone();
    let hoy = chrono::Local::now().date_naive();
    let stats = DashboardStats::fetch(&api, hoy).await?;

    if json {
        return print_json(&stats);
    }
    println!("Ventas hoy:           {}", stats.ventas_hoy);
    println!("Vendido hoy:          {}", format_money(stats.vendido_hoy));
    println!("Ventas registradas:   {}", stats.total_ventas);
    println!("Clientes:             {}", stats.total_clientes);
    println!("Productos:            {}", stats.productos_stock);
    println!("Bajo stock:           {}", stats.productos_bajo_stock);
    Ok(())
}

async fn tags(config: &Config, json: bool) -> Result<()> {
    let api = logged_in(config)?.api().clone();
    let board = TagBoard::load(&api).await?;

    if json {
        return print_json(&serde_json::json!({
            "visible": board.visible,
            "hidden": board.hidden,
        }));
    }
    for tag in &board.visible {
        println!("{:<width$}  {:>4}", truncate(&tag.nombre, NAME_WIDTH), tag.respuestas_count, width = NAME_WIDTH);
    }
    if !board.hidden.is_empty() {
        println!("-- ocultas --");
        for tag in &board.hidden {
            println!("{:<width$}  {:>4}", truncate(&tag.nombre, NAME_WIDTH), tag.respuestas_count, width = NAME_WIDTH);
        }
    }
    Ok(())
}
