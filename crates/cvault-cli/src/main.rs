//! cvault: CryptoVault command-line client
//!
//! Commands:
//!   keygen                   - generate a random key and print it as base64
//!   encrypt / decrypt        - text messages (stdin or --text), base64 blobs
//!   encrypt-file <path>      - write <name>.encrypted (filename sealed inside)
//!   decrypt-file <path>      - restore the original file under its sealed name
//!   deny create / deny open  - two-password deniable containers
//!   config show              - display current configuration
//!
//! Every command uses a key when --key/--key-file is given and a password
//! (Argon2id) otherwise. Crypto work runs on the blocking pool.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use cvault_core::{VaultConfig, VaultError, VaultResult};
use cvault_crypto::{
    create_file_container, create_message_container, decrypt_file, decrypt_file_with_password,
    detect_kind, encrypt_file, encrypt_file_with_password, export_key, generate_key, import_key,
    open_file_container, open_message_container, pack_message, pack_message_with_password,
    unpack_message, unpack_message_with_password, analyze_strength, ContainerKind, FilePayload,
    KdfParams, SymmetricKey,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cvault",
    version,
    about = "CryptoVault encryption client",
    long_about = "cvault: AES-256-GCM message and file encryption with keys or Argon2id passwords, plus deniable containers"
)]
struct Cli {
    /// Path to cvault.toml configuration file
    #[arg(long, short = 'c', env = "CVAULT_CONFIG", default_value = "~/.config/cvault/config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, env = "CVAULT_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides config
    #[arg(long, env = "CVAULT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a random 256-bit key and print it as base64
    Keygen {
        /// Also write the key to this file (mode 0600 on Unix)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Encrypt a text message; prints a base64 blob
    Encrypt {
        /// Message text (default: read stdin)
        #[arg(long, short = 't')]
        text: Option<String>,
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Decrypt a base64 blob produced by `encrypt`
    Decrypt {
        /// Blob text (default: read stdin)
        #[arg(long, short = 't')]
        text: Option<String>,
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Encrypt a file; the original filename is sealed inside the blob
    #[command(name = "encrypt-file")]
    EncryptFile {
        /// File to encrypt
        input: PathBuf,
        /// Output path (default: <output_dir>/<name><encrypted_suffix>)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Decrypt a file; output is written under its original filename
    #[command(name = "decrypt-file")]
    DecryptFile {
        /// Encrypted file
        input: PathBuf,
        /// Directory to write into (default: config output_dir or current dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Deniable two-password containers
    Deny {
        #[command(subcommand)]
        action: DenyAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Key or password selection shared by the encrypt/decrypt commands.
#[derive(Args, Debug)]
struct SecretArgs {
    /// Base64 key from `keygen`
    #[arg(long, env = "CVAULT_KEY", hide_env_values = true, conflicts_with = "key_file")]
    key: Option<String>,

    /// File containing a base64 key
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Password (prompted for when neither a key nor a password is given)
    #[arg(long, env = "CVAULT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum DenyAction {
    /// Build a container holding a real and a decoy payload
    Create {
        /// Real message text, or a file path with --file
        #[arg(long)]
        real: String,
        /// Decoy message text, or a file path with --file
        #[arg(long)]
        decoy: String,
        /// Treat --real and --decoy as files and build a binary file container
        #[arg(long)]
        file: bool,
        /// Output path (required with --file; default stdout for messages)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        #[arg(long, env = "CVAULT_REAL_PASSWORD", hide_env_values = true)]
        real_password: Option<String>,
        #[arg(long, env = "CVAULT_DECOY_PASSWORD", hide_env_values = true)]
        decoy_password: Option<String>,
    },

    /// Open a container with one password
    ///
    /// Output is identical whichever slot the password unlocks.
    Open {
        /// Container file (default: read stdin)
        input: Option<PathBuf>,
        /// Directory for file containers (default: config output_dir or current dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, env = "CVAULT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

/// Resolved key material for one command.
enum Secret {
    Key(SymmetricKey),
    Password(SecretString),
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = expand_tilde(&cli.config);
    let config = VaultConfig::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    match cli.command {
        Commands::Keygen { out } => cmd_keygen(out.as_deref()).await,
        Commands::Encrypt { text, secret } => {
            let secret = resolve_secret(secret, true)?;
            let blob = cmd_encrypt(read_text(text).await?, secret).await?;
            println!("{blob}");
            Ok(())
        }
        Commands::Decrypt { text, secret } => {
            let secret = resolve_secret(secret, false)?;
            let plaintext = cmd_decrypt(read_text(text).await?, secret).await?;
            println!("{plaintext}");
            Ok(())
        }
        Commands::EncryptFile { input, out, secret } => {
            let secret = resolve_secret(secret, true)?;
            let path = cmd_encrypt_file(&config, &input, out.as_deref(), secret).await?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::DecryptFile { input, out_dir, secret } => {
            let secret = resolve_secret(secret, false)?;
            let path = cmd_decrypt_file(&config, &input, out_dir.as_deref(), secret).await?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Deny { action } => cmd_deny(&config, action).await,
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stderr keeps stdout clean for blobs and plaintext
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Input helpers ─────────────────────────────────────────────────────────────

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

/// Use `text` if given, else all of stdin minus one trailing newline.
async fn read_text(text: Option<String>) -> Result<String> {
    if let Some(t) = text {
        return Ok(t);
    }
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("reading stdin")?;
    Ok(strip_trailing_newline(buf))
}

fn strip_trailing_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

fn resolve_secret(args: SecretArgs, confirm: bool) -> Result<Secret> {
    if let Some(text) = args.key {
        return Ok(Secret::Key(import_key(&text).context("importing --key")?));
    }
    if let Some(path) = args.key_file {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading key file: {}", path.display()))?;
        return Ok(Secret::Key(
            import_key(&text).with_context(|| format!("importing key file: {}", path.display()))?,
        ));
    }
    let password = password_or_prompt(args.password, "Password: ", confirm)?;
    Ok(Secret::Password(password))
}

fn prompt_password(prompt: &str, confirm: bool) -> Result<SecretString> {
    let first = SecretString::from(rpassword::prompt_password(prompt).context("reading password")?);
    if first.expose_secret().is_empty() {
        anyhow::bail!("password must not be empty");
    }
    if confirm {
        let second =
            SecretString::from(rpassword::prompt_password("Confirm: ").context("reading password")?);
        if first.expose_secret() != second.expose_secret() {
            anyhow::bail!("passwords do not match");
        }
    }
    Ok(first)
}

/// Take a password from a flag or env var, else prompt. `new` marks a
/// password that is about to protect data: it is confirmed when prompted and
/// its strength grade is reported on stderr.
fn password_or_prompt(value: Option<String>, prompt: &str, new: bool) -> Result<SecretString> {
    let password = match value {
        Some(p) => SecretString::from(p),
        None => prompt_password(prompt, new)?,
    };
    if password.expose_secret().is_empty() {
        anyhow::bail!("password must not be empty");
    }
    if new {
        eprintln!("{}", strength_notice(prompt, password.expose_secret()));
    }
    Ok(password)
}

/// One stderr line grading a new password, e.g. `Real password strength: fair (consider ...)`.
fn strength_notice(prompt: &str, password: &str) -> String {
    let label = prompt.trim_end().trim_end_matches(':');
    let grade = analyze_strength(password);
    if grade.is_weak() {
        warn!(%grade, "weak password");
        format!(
            "{label} strength: {grade} (consider 12+ characters mixing case, digits and symbols)"
        )
    } else {
        format!("{label} strength: {grade}")
    }
}

/// Run an engine call on the blocking pool; Argon2id holds a core for
/// hundreds of milliseconds.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> VaultResult<T> + Send + 'static,
    T: Send + 'static,
{
    let out = tokio::task::spawn_blocking(f)
        .await
        .context("crypto task aborted")?;
    Ok(out?)
}

fn output_dir(config: &VaultConfig, override_dir: Option<&Path>) -> PathBuf {
    override_dir
        .map(Path::to_path_buf)
        .or_else(|| config.files.output_dir.as_deref().map(expand_tilde))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<output_dir>/<file name><encrypted_suffix>`
fn encrypted_output_path(config: &VaultConfig, input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    output_dir(config, None).join(format!("{name}{}", config.files.encrypted_suffix))
}

/// Reduce a filename recovered from a blob to a single path component.
fn safe_filename(name: &str) -> PathBuf {
    Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("decrypted.bin"))
}

async fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory: {}", parent.display()))?;
    }
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

// ── `cvault keygen` ───────────────────────────────────────────────────────────

async fn cmd_keygen(out: Option<&Path>) -> Result<()> {
    let key = generate_key();
    let text = export_key(&key)?;

    if let Some(path) = out {
        write_key_file(path, &text)?;
        info!(path = %path.display(), "key written");
    }

    println!("{text}");
    Ok(())
}

/// Write a key file that is owner-only from the moment it exists.
fn write_key_file(path: &Path, text: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("creating key file: {}", path.display()))?;

    // mode() only applies on creation; tighten a pre-existing file before writing
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting permissions: {}", path.display()))?;
    }

    writeln!(file, "{text}").with_context(|| format!("writing {}", path.display()))
}

// ── `cvault encrypt` / `cvault decrypt` ───────────────────────────────────────

async fn cmd_encrypt(plaintext: String, secret: Secret) -> Result<String> {
    let blob = match secret {
        Secret::Key(key) => blocking(move || pack_message(&plaintext, &key)).await,
        Secret::Password(pw) => {
            blocking(move || pack_message_with_password(&plaintext, &pw, &KdfParams::default()))
                .await
        }
    }
    .context("encrypting message")?;
    info!(bytes = blob.len(), "message encrypted");
    Ok(blob)
}

async fn cmd_decrypt(blob: String, secret: Secret) -> Result<String> {
    match secret {
        Secret::Key(key) => blocking(move || unpack_message(&blob, &key)).await,
        Secret::Password(pw) => {
            blocking(move || unpack_message_with_password(&blob, &pw, &KdfParams::default())).await
        }
    }
    .context("decrypting message")
}

// ── `cvault encrypt-file` / `cvault decrypt-file` ─────────────────────────────

async fn cmd_encrypt_file(
    config: &VaultConfig,
    input: &Path,
    out: Option<&Path>,
    secret: Secret,
) -> Result<PathBuf> {
    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let blob = match secret {
        Secret::Key(key) => blocking(move || encrypt_file(&filename, &data, &key)).await,
        Secret::Password(pw) => {
            blocking(move || {
                encrypt_file_with_password(&filename, &data, &pw, &KdfParams::default())
            })
            .await
        }
    }
    .with_context(|| format!("encrypting {}", input.display()))?;

    let dest = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| encrypted_output_path(config, input));
    write_output(&dest, &blob).await?;

    info!(input = %input.display(), output = %dest.display(), bytes = blob.len(), "file encrypted");
    Ok(dest)
}

async fn cmd_decrypt_file(
    config: &VaultConfig,
    input: &Path,
    out_dir: Option<&Path>,
    secret: Secret,
) -> Result<PathBuf> {
    let blob = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;

    let payload = match secret {
        Secret::Key(key) => blocking(move || decrypt_file(&blob, &key)).await,
        Secret::Password(pw) => {
            blocking(move || decrypt_file_with_password(&blob, &pw, &KdfParams::default())).await
        }
    }
    .with_context(|| format!("decrypting {}", input.display()))?;

    let dest = output_dir(config, out_dir).join(safe_filename(&payload.filename));
    write_output(&dest, &payload.data).await?;

    info!(input = %input.display(), output = %dest.display(), "file decrypted");
    Ok(dest)
}

// ── `cvault deny` ─────────────────────────────────────────────────────────────

async fn cmd_deny(config: &VaultConfig, action: DenyAction) -> Result<()> {
    match action {
        DenyAction::Create {
            real,
            decoy,
            file,
            out,
            real_password,
            decoy_password,
        } => {
            let real_pw = password_or_prompt(real_password, "Real password: ", true)?;
            let decoy_pw = password_or_prompt(decoy_password, "Decoy password: ", true)?;

            if file {
                let out = out.context("--out is required for file containers")?;
                let real = read_payload(Path::new(&real)).await?;
                let decoy = read_payload(Path::new(&decoy)).await?;
                deny_create_file(real, decoy, real_pw, decoy_pw, &out, KdfParams::default()).await
            } else {
                if real.is_empty() || decoy.is_empty() {
                    anyhow::bail!("both real and decoy messages are required");
                }
                let container = blocking(move || {
                    create_message_container(
                        &real,
                        &decoy,
                        &real_pw,
                        &decoy_pw,
                        &KdfParams::default(),
                    )
                })
                .await
                .context("creating container")?;

                match out {
                    Some(path) => write_output(&path, format!("{container}\n").as_bytes()).await,
                    None => {
                        println!("{container}");
                        Ok(())
                    }
                }
            }
        }
        DenyAction::Open {
            input,
            out_dir,
            password,
        } => {
            let password = password_or_prompt(password, "Password: ", false)?;
            let raw = match input {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut buf)
                        .await
                        .context("reading stdin")?;
                    buf
                }
            };
            let dir = output_dir(config, out_dir.as_deref());
            match deny_open(raw, password, &dir, KdfParams::default()).await? {
                DenyOutput::Message(text) => println!("{text}"),
                DenyOutput::File(dest) => println!("{}", dest.display()),
            }
            Ok(())
        }
    }
}

async fn read_payload(path: &Path) -> Result<FilePayload> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(FilePayload::new(name, data))
}

async fn deny_create_file(
    real: FilePayload,
    decoy: FilePayload,
    real_pw: SecretString,
    decoy_pw: SecretString,
    out: &Path,
    params: KdfParams,
) -> Result<()> {
    let container =
        blocking(move || create_file_container(&real, &decoy, &real_pw, &decoy_pw, &params))
            .await
            .context("creating container")?;

    write_output(out, &container).await?;
    info!(output = %out.display(), bytes = container.len(), "file container written");
    Ok(())
}

/// What `deny open` produced. Carries no hint of which slot matched.
#[derive(Debug, PartialEq, Eq)]
enum DenyOutput {
    Message(String),
    File(PathBuf),
}

/// Open a container of either kind. File payloads are written under `dir`.
async fn deny_open(
    raw: Vec<u8>,
    password: SecretString,
    dir: &Path,
    params: KdfParams,
) -> Result<DenyOutput> {
    if detect_kind(&raw) == Some(ContainerKind::File) {
        let opened = blocking(move || open_file_container(&raw, &password, &params))
            .await
            .context("opening container")?;
        let dest = dir.join(safe_filename(&opened.data.filename));
        write_output(&dest, &opened.data.data).await?;
        return Ok(DenyOutput::File(dest));
    }

    let text = String::from_utf8(raw)
        .map_err(|_| VaultError::InvalidContainerFormat)
        .context("opening container")?;
    let opened = blocking(move || open_message_container(&text, &password, &params))
        .await
        .context("opening container")?;
    Ok(DenyOutput::Message(opened.data))
}

// ── `cvault config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &VaultConfig, path: &Path) -> Result<()> {
    println!("# config: {}", path.display());
    let rendered = toml::to_string_pretty(config).context("serializing config")?;
    print!("{rendered}");
    Ok(())
}
