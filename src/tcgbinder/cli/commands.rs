use super::render::{
    print_message, print_messages, render_binder_page, render_binders, render_cache_entries,
    render_config, render_search_page,
};
use super::setup::{
    BinderCommands, CacheCommands, Cli, Commands, ProfileCommands, SortKey, ThemeMode,
};
use clap::Parser;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tcgbinder::commands::config::{run as run_config, ConfigAction};
use tcgbinder::commands::{CmdResult, MessageLevel};
use tcgbinder::error::{BinderError, Result};
use tcgbinder::init::{data_dir, initialize, BinderContext};

/// Extra time granted on top of the fetch timeout before giving up on workers.
const WAIT_SLACK: Duration = Duration::from_secs(2);

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dir = data_dir()?;

    // Config needs no session.
    if let Some(Commands::Config { key, value }) = &cli.command {
        return handle_config(&dir, key.clone(), value.clone());
    }

    let mut ctx = init_context(&cli, &dir)?;
    // Stopped when dropped at the end of the command.
    let _sweeper = ctx.spawn_sweeper()?;

    match cli.command {
        Some(Commands::Show { page, filter }) => handle_show(&mut ctx, page, filter),
        Some(Commands::AddSet { name, yes }) => handle_add_set(&mut ctx, &name.join(" "), yes),
        Some(Commands::Add { name, yes }) => handle_add(&mut ctx, &name.join(" "), yes),
        Some(Commands::Remove { pos }) => {
            let pos = position(pos)?;
            finish(ctx.app.remove_card(pos)?)
        }
        Some(Commands::Move { from, to }) => {
            let (from, to) = (position(from)?, position(to)?);
            finish(ctx.app.move_card(from, to)?)
        }
        Some(Commands::MoveToPage { from, page }) => {
            let from = position(from)?;
            finish(ctx.app.move_to_page(from, page)?)
        }
        Some(Commands::Clear) => finish(ctx.app.clear_binder()?),
        Some(Commands::Sort { by }) => finish(match by {
            SortKey::Name => ctx.app.sort_by_name()?,
            SortKey::Number => ctx.app.sort_by_number()?,
        }),
        Some(Commands::Layout { rows, cols, pages }) => {
            finish(ctx.app.apply_layout(&rows, &cols, &pages)?)
        }
        Some(Commands::Binder { action }) => handle_binder(&mut ctx, action),
        Some(Commands::Profile { action }) => handle_profile(&mut ctx, action),
        Some(Commands::Theme { mode }) => finish(ctx.app.set_theme(mode == ThemeMode::Dark)?),
        Some(Commands::Search { name, filter, page }) => {
            handle_search(&mut ctx, &name.join(" "), filter, page)
        }
        Some(Commands::Progress { set }) => handle_progress(&mut ctx, &set.join(" ")),
        Some(Commands::Buy { pos }) => {
            println!("{}", ctx.app.buy_url(position(pos)?)?);
            Ok(())
        }
        Some(Commands::Image { pos, out, width }) => handle_image(&mut ctx, pos, out, width),
        Some(Commands::Cache { action }) => handle_cache(&ctx, action),
        Some(Commands::Config { .. }) => Ok(()),
        None => handle_show(&mut ctx, None, None),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn init_context(cli: &Cli, dir: &Path) -> Result<BinderContext> {
    let mut ctx = initialize(dir)?;
    print_messages(&ctx.notices);

    if let Some(user) = &cli.user {
        ctx.app
            .login(user, cli.password.as_deref().unwrap_or_default())?;
    }
    if let Some(binder) = &cli.binder {
        ctx.app.select_binder(binder)?;
    }
    Ok(ctx)
}

/// Slot numbers on the command line are 1-based.
fn position(n: usize) -> Result<usize> {
    n.checked_sub(1)
        .ok_or_else(|| BinderError::Validation("Slot numbers start at 1".to_string()))
}

fn finish(result: CmdResult) -> Result<()> {
    print_messages(&result.messages);
    Ok(())
}

/// Runs posted results until every worker has reported back.
fn wait_for_workers(ctx: &mut BinderContext) -> Result<()> {
    let timeout = ctx.config.fetch_timeout() + WAIT_SLACK;
    if ctx.main.run_until(&mut ctx.app, |app| app.is_idle(), timeout) {
        Ok(())
    } else {
        Err(BinderError::Api("Timed out waiting for the catalog".to_string()))
    }
}

/// Waits for a catalog request and turns a failed one into an error.
fn wait_for_catalog(ctx: &mut BinderContext) -> Result<()> {
    wait_for_workers(ctx)?;
    match ctx.app.status() {
        Some(status) if status.level == MessageLevel::Error => {
            Err(BinderError::Api(status.content.clone()))
        }
        Some(status) => {
            print_message(status);
            Ok(())
        }
        None => Ok(()),
    }
}

fn confirm(question: &str) -> bool {
    if !std::io::stdin().is_terminal() {
        return false;
    }
    print!("{} [y/N] ", question);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Runs an add; if it stops at the capacity check, asks and runs it again.
fn add_with_confirmation<F>(ctx: &mut BinderContext, yes: bool, mut add: F) -> Result<()>
where
    F: FnMut(&mut BinderContext, bool) -> Result<CmdResult>,
{
    let result = add(ctx, yes)?;
    let Some(prompt) = result.confirmation.clone() else {
        return finish(result);
    };
    if confirm(&prompt.question()) {
        return finish(add(ctx, true)?);
    }
    print_messages(&result.messages);
    println!("{}", prompt.question());
    println!("Nothing added. Re-run with --yes to add anyway.");
    Ok(())
}

fn handle_show(ctx: &mut BinderContext, page: Option<usize>, filter: Option<String>) -> Result<()> {
    if let Some(query) = filter {
        ctx.app.set_binder_query_now(&query);
    }
    if let Some(page) = page {
        ctx.app.go_to_page(page)?;
    }
    print!("{}", render_binder_page(&ctx.app.binder_page()?));
    Ok(())
}

fn handle_add_set(ctx: &mut BinderContext, name: &str, yes: bool) -> Result<()> {
    ctx.app.load_set(name)?;
    wait_for_catalog(ctx)?;
    add_with_confirmation(ctx, yes, |ctx, confirmed| ctx.app.add_loaded_set(confirmed))
}

fn handle_add(ctx: &mut BinderContext, name: &str, yes: bool) -> Result<()> {
    ctx.app.search_cards(name)?;
    wait_for_catalog(ctx)?;
    if ctx.app.search_view().displayed().is_empty() {
        return Err(BinderError::Api(format!("No card named '{}'", name)));
    }
    add_with_confirmation(ctx, yes, |ctx, confirmed| {
        ctx.app.add_search_result(0, confirmed)
    })
}

fn handle_search(
    ctx: &mut BinderContext,
    name: &str,
    filter: Option<String>,
    page: Option<usize>,
) -> Result<()> {
    ctx.app.search_cards(name)?;
    wait_for_catalog(ctx)?;
    if let Some(query) = filter {
        ctx.app.set_search_query_now(&query);
    }
    if let Some(page) = page {
        ctx.app.search_go_to_page(page);
    }
    print!("{}", render_search_page(&ctx.app.search_page()));
    Ok(())
}

fn handle_progress(ctx: &mut BinderContext, set: &str) -> Result<()> {
    ctx.app.load_set(set)?;
    wait_for_catalog(ctx)?;
    match ctx.app.progress()? {
        Some(progress) => println!("{}", progress),
        None => println!("No set loaded."),
    }
    Ok(())
}

fn handle_image(ctx: &mut BinderContext, pos: usize, out: PathBuf, width: u32) -> Result<()> {
    let position = position(pos)?;
    if !ctx.app.request_slot_image(position, width)? {
        return Err(BinderError::Validation(format!("No card in slot {}", pos)));
    }
    wait_for_workers(ctx)?;
    let image = ctx
        .app
        .slot_image(position)
        .ok_or_else(|| BinderError::Api(format!("Could not fetch the image for slot {}", pos)))?;
    image.save(&out)?;
    println!("Saved {} ({}x{})", out.display(), image.width(), image.height());
    Ok(())
}

fn handle_binder(ctx: &mut BinderContext, action: BinderCommands) -> Result<()> {
    match action {
        BinderCommands::List => {
            let result = ctx.app.list_binders()?;
            print!("{}", render_binders(&result.binders, &ctx.app.session().binder));
            Ok(())
        }
        BinderCommands::Create { name } => finish(ctx.app.create_binder(&name)?),
        BinderCommands::Delete { name } => finish(ctx.app.delete_binder(&name)?),
    }
}

fn handle_profile(ctx: &mut BinderContext, action: ProfileCommands) -> Result<()> {
    match action {
        ProfileCommands::Create { name, password } => {
            finish(ctx.app.create_profile(&name, &password)?)
        }
        ProfileCommands::Login { name, password } => {
            ctx.app.login(&name, &password)?;
            if let Some(status) = ctx.app.status() {
                print_message(status);
            }
            let result = ctx.app.list_binders()?;
            print!("{}", render_binders(&result.binders, &ctx.app.session().binder));
            Ok(())
        }
    }
}

fn handle_cache(ctx: &BinderContext, action: CacheCommands) -> Result<()> {
    match action {
        CacheCommands::List => {
            let mut entries = ctx.images.entries()?;
            entries.sort_by(|a, b| b.touched.cmp(&a.touched));
            print!("{}", render_cache_entries(&entries));
        }
        CacheCommands::Sweep => {
            let report = ctx.images.sweep()?;
            println!(
                "Removed {} file(s), {} kept (limit {})",
                report.removed.len(),
                report.kept,
                ctx.images.max_files()
            );
        }
    }
    Ok(())
}

fn handle_config(dir: &Path, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };
    let result = run_config(dir, action)?;
    if let (Some(config), true) = (&result.config, result.messages.is_empty()) {
        print!("{}", render_config(config));
    }
    print_messages(&result.messages);
    if result.has_errors() {
        return Err(BinderError::Validation("invalid configuration".to_string()));
    }
    Ok(())
}
