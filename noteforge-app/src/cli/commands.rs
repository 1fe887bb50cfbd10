use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::generator::build_generator;

use anyhow::{anyhow, bail, Result};
use noteforge_core::{
    accuracy, filter_notes_by_tag, filter_notes_by_text, filter_sets_by_text, validate_count,
    CardStatus, Flashcard, FlashcardSet, Forge, GenerationError, GenerationResult, Note,
    OwnerId, Repository, Settings, Step, MAX_FRESH_COUNT, MAX_REFORGE_COUNT,
};
use noteforge_json::paths::default_sqlite_file;
use noteforge_json::{JsonStore, SettingsFile};
use noteforge_sqlite::SqliteRepo;
use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Everything a command needs: the service, the effective settings and the
/// file they came from.
pub struct AppContext {
    pub forge: Arc<Forge>,
    pub settings: Settings,
    pub settings_file: SettingsFile,
}

impl AppContext {
    fn owner(&self) -> OwnerId {
        self.settings.owner_id
    }

    fn repo(&self) -> &Arc<dyn Repository> {
        self.forge.repo()
    }
}

pub async fn run_cli(args: Cli) -> Result<()> {
    let ctx = open_forge(&args).await?;
    match args.cmd {
        Command::Note(cmd) => note_cmd(&ctx, cmd).await,
        Command::Generate(cmd) => generate_cmd(&ctx, cmd).await,
        Command::Reforge(cmd) => reforge_cmd(&ctx, cmd).await,
        Command::Set(cmd) => set_cmd(&ctx, cmd).await,
        Command::Study { set } => study_cmd(&ctx, &set).await,
        Command::Settings(cmd) => settings_cmd(&ctx, cmd),
        Command::Dashboard => dashboard_cmd(&ctx).await,
        Command::Api(api) => {
            let addr: std::net::SocketAddr = api.addr.parse()?;
            api_server::run(ctx.forge, ctx.settings, addr).await
        }
        Command::Tui => bail!("the TUI is started from main"),
    }
}

pub async fn open_repo(store: &StoreKind, db_path: Option<PathBuf>) -> Result<Arc<dyn Repository>> {
    match store {
        StoreKind::Json => {
            let s = JsonStore::open_default().await?;
            Ok(Arc::new(s))
        }
        StoreKind::Sqlite => {
            let p = db_path.unwrap_or_else(default_sqlite_file);
            let s = SqliteRepo::open_file(&p).await?;
            Ok(Arc::new(s))
        }
    }
}

pub async fn open_forge(args: &Cli) -> Result<AppContext> {
    let settings_file = match &args.settings {
        Some(p) => SettingsFile::new(p),
        None => SettingsFile::open_default(),
    };
    let mut settings = settings_file.load_or_create()?;
    if let Some(model) = args.model.as_deref().filter(|m| !m.trim().is_empty()) {
        settings.model = model.trim().to_string();
    }

    let repo = open_repo(&args.store, args.db_path.clone()).await?;
    let generator = build_generator(args.api_key.as_deref(), &settings);
    let forge = Forge::new(repo, generator).with_params(settings.params.clone());
    Ok(AppContext {
        forge: Arc::new(forge),
        settings,
        settings_file,
    })
}

async fn note_cmd(ctx: &AppContext, cmd: NoteCmd) -> Result<()> {
    let owner = ctx.owner();
    match cmd {
        NoteCmd::Add(a) => {
            let content = read_content(a.content, a.file)?.unwrap_or_default();
            if a.title.trim().is_empty() {
                bail!("note title is required");
            }
            let n = ctx.forge.create_note(owner, a.title.trim(), &content, &a.tags).await?;
            println!("{}", n.id);
        }
        NoteCmd::List { query, tag } => {
            let mut notes = ctx.repo().list_notes(owner).await?;
            if let Some(q) = query {
                notes = filter_notes_by_text(&notes, &q);
            }
            if let Some(t) = tag {
                notes = filter_notes_by_tag(&notes, &t);
            }
            for n in notes {
                let tags = if n.tags.is_empty() { "-".to_string() } else { n.tags.join(";") };
                println!(
                    "{}\t{}\t{}\ttags={}\tchars={}",
                    n.id,
                    n.title,
                    n.updated_at.format("%Y-%m-%d %H:%M"),
                    tags,
                    n.content.chars().count()
                );
            }
        }
        NoteCmd::Show { note } => {
            let n = resolve_note(ctx, &note).await?;
            println!("# {}", n.title);
            if !n.tags.is_empty() {
                println!("tags: {}", n.tags.join(", "));
            }
            println!("\n{}", n.content);
        }
        NoteCmd::Edit(e) => {
            let n = resolve_note(ctx, &e.note).await?;
            let title = e.title.unwrap_or_else(|| n.title.clone());
            let content = read_content(e.content, e.file)?.unwrap_or_else(|| n.content.clone());

            let mut tags = n.tags.clone();
            for t in e.add_tags {
                if !tags.iter().any(|x| x.eq_ignore_ascii_case(&t)) {
                    tags.push(t);
                }
            }
            tags.retain(|x| !e.rm_tags.iter().any(|r| x.eq_ignore_ascii_case(r)));

            ctx.forge.save_note(owner, n.id, &title, &content, &tags).await?;
            println!("ok");
        }
        NoteCmd::Rm { note } => {
            let n = resolve_note(ctx, &note).await?;
            ctx.repo().delete_note(owner, n.id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn generate_cmd(ctx: &AppContext, cmd: GenerateCmd) -> Result<()> {
    let owner = ctx.owner();
    let note = resolve_note(ctx, &cmd.note).await?;

    let mut gs = ctx.settings.generation.clone();
    if let Some(c) = cmd.count {
        gs.min_count = c;
    }
    if let Some(d) = cmd.difficulty {
        gs.difficulty = d.into();
    }
    if let Some(i) = cmd.instructions {
        gs.custom_prompt = i;
    }
    let preview = cmd.preview || gs.preview_mode;

    println!("Generating {} flashcards from \"{}\"...", gs.min_count, note.title);
    let forged = if preview {
        let result = ctx
            .forge
            .preview_for_note(owner, note.id, &gs)
            .await
            .map_err(user_error)?;
        print_generated(&result);
        if !confirm(&format!("Save these {} cards? [y/N] ", result.flashcards.len()))? {
            println!("discarded");
            return Ok(());
        }
        ctx.forge
            .save_generated(owner, Some(&note), result)
            .await
            .map_err(user_error)?
    } else {
        ctx.forge
            .generate_for_note(owner, note.id, &gs)
            .await
            .map_err(user_error)?
    };

    println!(
        "{}\t{}\tcards={}\ttokens~{}\tcost={}c",
        forged.set.id,
        forged.set.title,
        forged.cards.len(),
        forged.result.estimated_tokens,
        forged.result.estimated_cost_cents
    );
    Ok(())
}

async fn reforge_cmd(ctx: &AppContext, cmd: ReforgeCmd) -> Result<()> {
    let owner = ctx.owner();
    let set = resolve_set(ctx, &cmd.set).await?;

    let mut rs = ctx.settings.reforge.clone();
    if let Some(a) = cmd.action {
        rs.action = a.into();
    }
    if let Some(c) = cmd.count {
        rs.min_count = c;
    }
    if let Some(d) = cmd.difficulty {
        rs.difficulty = d.into();
    }
    if cmd.section.is_some() {
        rs.use_selected_section = true;
    }
    let section = cmd.section.as_deref();

    let forged = if cmd.preview || rs.preview_mode {
        let note_id = set
            .note_id
            .ok_or_else(|| anyhow!("This set has no source note to reforge from"))?;
        let note = ctx.forge.owned_note(owner, note_id).await?;
        let result = ctx
            .forge
            .preview_reforge(owner, set.id, &note.content, section, &rs)
            .await
            .map_err(user_error)?;
        print_generated(&result);
        if !confirm(&format!("{} with these {} cards? [y/N] ", rs.action.as_str(), result.flashcards.len()))? {
            println!("discarded");
            return Ok(());
        }
        ctx.forge
            .apply_reforge(owner, set.id, rs.action, result)
            .await
            .map_err(user_error)?
    } else {
        ctx.forge
            .reforge(owner, set.id, section, &rs)
            .await
            .map_err(user_error)?
    };

    println!(
        "{}\t{}\taction={}\ttotal={}\tmastered={}",
        forged.set.id,
        forged.set.title,
        rs.action.as_str(),
        forged.set.total_cards,
        forged.set.mastered_cards
    );
    Ok(())
}

async fn set_cmd(ctx: &AppContext, cmd: SetCmd) -> Result<()> {
    let owner = ctx.owner();
    match cmd {
        SetCmd::List { query } => {
            let mut sets = ctx.repo().list_sets(owner).await?;
            if let Some(q) = query {
                sets = filter_sets_by_text(&sets, &q);
            }
            for s in sets {
                println!(
                    "{}\t{}\t{}/{} mastered\tpublic={}",
                    s.id, s.title, s.mastered_cards, s.total_cards, s.is_public
                );
            }
        }
        SetCmd::Show { set } => {
            let s = resolve_set(ctx, &set).await?;
            println!("# {}", s.title);
            if let Some(d) = &s.description {
                println!("{d}");
            }
            for c in ctx.repo().list_flashcards(s.id).await? {
                print_card(&c);
            }
        }
        SetCmd::Progress { set } => {
            let s = resolve_set(ctx, &set).await?;
            let p = ctx.forge.set_progress(s.id).await?;
            println!("{}/{} mastered ({}%)", p.mastered, p.total, p.percentage);
        }
        SetCmd::Rm { set } => {
            let s = resolve_set(ctx, &set).await?;
            ctx.forge.delete_set(owner, s.id).await?;
            println!("ok");
        }
        SetCmd::Share { set } => {
            let s = resolve_set(ctx, &set).await?;
            ctx.forge.set_public(owner, s.id, true).await?;
            println!("shared {}", s.id);
        }
        SetCmd::Unshare { set } => {
            let s = resolve_set(ctx, &set).await?;
            ctx.forge.set_public(owner, s.id, false).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn study_cmd(ctx: &AppContext, sel: &str) -> Result<()> {
    let set = resolve_set(ctx, sel).await?;
    let nav = ctx.forge.navigator(set.id).await?;
    let Some(mut current) = nav.first() else {
        println!("no cards in set");
        return Ok(());
    };

    loop {
        let card = ctx.repo().get_flashcard(current).await?;
        let pos = nav.position(current).map(|p| p + 1).unwrap_or(0);
        println!("\n[{}/{}] ({})", pos, nav.len(), card.status.as_str());
        println!("Q: {}", card.question);
        println!("[enter=reveal, m=mastered, y=got it, x=missed, n=next, p=prev, q=quit]");

        let mut revealed = false;
        let advance = loop {
            let line = read_line("study> ")?;
            match line.trim().to_lowercase().as_str() {
                "" | "r" | "reveal" => {
                    if !revealed {
                        println!("A: {}", card.answer);
                        revealed = true;
                    }
                }
                "m" | "mastered" => {
                    let (_, progress) = ctx.forge.mark_mastered(card.id).await?;
                    println!("mastered: {}/{} ({}%)", progress.mastered, progress.total, progress.percentage);
                    break true;
                }
                "y" | "x" => {
                    let correct = line.trim().eq_ignore_ascii_case("y");
                    let status = if correct { CardStatus::Review } else { CardStatus::Learning };
                    let (updated, _) = ctx.forge.record_review(card.id, status, Some(correct)).await?;
                    println!("accuracy {:.0}%", accuracy(&updated) * 100.0);
                    break true;
                }
                "n" | "next" => break true,
                "p" | "prev" => {
                    match nav.previous(current) {
                        Some(prev) => {
                            current = prev;
                            break false;
                        }
                        None => println!("already at the first card"),
                    }
                }
                "q" | "quit" => return Ok(()),
                _ => println!("enter, m, y, x, n, p or q"),
            }
        };

        if advance {
            match nav.next(current) {
                Some(Step::Card(next)) => current = next,
                Some(Step::End) | None => {
                    let p = ctx.forge.set_progress(set.id).await?;
                    println!("\nend of set: {}/{} mastered ({}%)", p.mastered, p.total, p.percentage);
                    return Ok(());
                }
            }
        }
    }
}

fn settings_cmd(ctx: &AppContext, cmd: SettingsCmd) -> Result<()> {
    let file = &ctx.settings_file;
    let settings = match cmd {
        SettingsCmd::Show => ctx.settings.clone(),
        SettingsCmd::SetGeneration(a) => {
            if let Some(c) = a.count {
                validate_count(c, MAX_FRESH_COUNT).map_err(user_error)?;
            }
            file.update(|s| {
                let g = &mut s.generation;
                if let Some(c) = a.count {
                    g.min_count = c;
                }
                if let Some(d) = a.difficulty {
                    g.difficulty = d.into();
                }
                if let Some(p) = a.prompt {
                    g.custom_prompt = p;
                }
                if let Some(p) = a.preview {
                    g.preview_mode = p;
                }
            })?
        }
        SettingsCmd::SetReforge(a) => {
            if let Some(c) = a.count {
                validate_count(c, MAX_REFORGE_COUNT).map_err(user_error)?;
            }
            file.update(|s| {
                let r = &mut s.reforge;
                if let Some(action) = a.action {
                    r.action = action.into();
                }
                if let Some(c) = a.count {
                    r.min_count = c;
                }
                if let Some(d) = a.difficulty {
                    r.difficulty = d.into();
                }
                if let Some(u) = a.use_selected_section {
                    r.use_selected_section = u;
                }
                if let Some(p) = a.preview {
                    r.preview_mode = p;
                }
            })?
        }
        SettingsCmd::Reset => file.reset()?,
    };
    println!("{}", settings.to_json()?);
    Ok(())
}

async fn dashboard_cmd(ctx: &AppContext) -> Result<()> {
    let s = ctx.forge.dashboard(ctx.owner()).await?;
    println!("notes       {}", s.notes);
    println!("sets        {}", s.sets);
    println!("cards       {} ({} mastered, {}%)", s.cards, s.mastered, s.mastered_percentage);
    println!("generations {} ({} failed)", s.generations, s.failed_generations);
    println!("tokens      ~{}", s.tokens_used);
    println!("cost        {}c", s.cost_cents);
    Ok(())
}

// ===== Helpers =====

/// Keep the user-facing text; the details were already logged.
fn user_error(e: GenerationError) -> anyhow::Error {
    anyhow!(e.user_message())
}

fn read_content(inline: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(c), _) => Ok(Some(c)),
        (None, Some(p)) => Ok(Some(std::fs::read_to_string(&p)?)),
        (None, None) => Ok(None),
    }
}

async fn resolve_note(ctx: &AppContext, sel: &str) -> Result<Note> {
    let owner = ctx.owner();
    if let Ok(id) = Uuid::parse_str(sel) {
        if let Ok(n) = ctx.forge.owned_note(owner, id).await {
            return Ok(n);
        }
    }
    let notes = ctx.repo().list_notes(owner).await?;
    if let Some(n) = notes.into_iter().find(|n| n.title.eq_ignore_ascii_case(sel.trim())) {
        return Ok(n);
    }
    bail!("note not found: {}", sel)
}

async fn resolve_set(ctx: &AppContext, sel: &str) -> Result<FlashcardSet> {
    let owner = ctx.owner();
    if let Ok(id) = Uuid::parse_str(sel) {
        if let Ok(s) = ctx.forge.owned_set(owner, id).await {
            return Ok(s);
        }
    }
    let sets = ctx.repo().list_sets(owner).await?;
    if let Some(s) = sets.into_iter().find(|s| s.title.eq_ignore_ascii_case(sel.trim())) {
        return Ok(s);
    }
    bail!("set not found: {}", sel)
}

fn print_generated(result: &GenerationResult) {
    for (i, c) in result.flashcards.iter().enumerate() {
        println!("\n{}. [{}] {}", i + 1, c.difficulty, c.question);
        println!("   -> {}", c.answer);
    }
    println!(
        "\n~{} tokens, est. cost {}c",
        result.estimated_tokens, result.estimated_cost_cents
    );
}

fn print_card(c: &Flashcard) {
    println!("\n{}. [{} / {}] {}", c.position + 1, c.difficulty(), c.status.as_str(), c.question);
    println!("   -> {}", c.answer);
}

fn confirm(prompt: &str) -> Result<bool> {
    let answer = read_line(prompt)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    stdin().read_line(&mut s)?;
    Ok(s)
}
