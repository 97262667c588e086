//! Admin subcommands.

use std::io::Write;

use clap::{Args, Subcommand};

use filer_store::{Entry, FilerStore, FullPath, OpContext, StoreRegistry};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the store backends compiled into this binary.
    Backends,

    /// Show the metadata of one entry.
    Stat { path: String },

    /// List the children of a directory.
    Ls(ListArgs),

    /// Create a directory entry.
    Mkdir { path: String },

    /// Create an empty file entry.
    Touch { path: String },

    /// Remove one entry.
    Rm { path: String },

    /// Remove every entry under a directory, recursively.
    RmChildren { dir: String },

    /// Print an opaque KV value.
    KvGet { key: String },

    /// Store an opaque KV value.
    KvPut { key: String, value: String },

    /// Remove an opaque KV value.
    KvRm { key: String },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Directory to list.
    pub dir: String,

    /// Resume after (or at, with --include-start) this child name.
    #[arg(long, default_value = "")]
    pub start: String,

    /// Include the start child itself.
    #[arg(long, default_value_t = false)]
    pub include_start: bool,

    /// Entries per page.
    #[arg(long, default_value_t = 1000)]
    pub limit: i64,

    /// Only list children whose name starts with this prefix.
    #[arg(long, default_value = "")]
    pub prefix: String,
}

fn format_time(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

fn print_entry(out: &mut impl Write, entry: &Entry) -> std::io::Result<()> {
    writeln!(out, "path:    {}", entry.full_path)?;
    writeln!(
        out,
        "type:    {}",
        if entry.is_directory() { "directory" } else { "file" }
    )?;
    writeln!(out, "mode:    {:o}", entry.attr.mode)?;
    writeln!(out, "owner:   {}:{}", entry.attr.uid, entry.attr.gid)?;
    writeln!(out, "size:    {}", entry.attr.file_size)?;
    writeln!(out, "chunks:  {}", entry.chunks.len())?;
    writeln!(out, "mtime:   {}", format_time(entry.attr.mtime))?;
    writeln!(out, "crtime:  {}", format_time(entry.attr.crtime))?;
    Ok(())
}

impl Command {
    /// Run against an opened store, writing human-readable output to `out`.
    pub async fn run(
        self,
        registry: &StoreRegistry,
        store: &dyn FilerStore,
        ctx: &OpContext,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        match self {
            Command::Backends => {
                for name in registry.names() {
                    let marker = if name == store.name() { "*" } else { " " };
                    writeln!(out, "{} {}", marker, name)?;
                }
            }
            Command::Stat { path } => {
                let entry = store.find_entry(ctx, &FullPath::from(path)).await?;
                print_entry(out, &entry)?;
            }
            Command::Ls(args) => {
                let mut names = Vec::new();
                let last = store
                    .list_directory_prefixed_entries(
                        ctx,
                        &FullPath::from(args.dir),
                        &args.start,
                        args.include_start,
                        args.limit,
                        &args.prefix,
                        &mut |entry: Entry| {
                            let suffix = if entry.is_directory() { "/" } else { "" };
                            names.push(format!("{}{}", entry.full_path, suffix));
                            true
                        },
                    )
                    .await?;
                for name in &names {
                    writeln!(out, "{}", name)?;
                }
                if names.len() as i64 == args.limit {
                    writeln!(out, "-- more entries after {:?}", last)?;
                }
            }
            Command::Mkdir { path } => {
                store
                    .insert_entry(ctx, &Entry::new_directory(path, 0o755))
                    .await?;
            }
            Command::Touch { path } => {
                store
                    .insert_entry(ctx, &Entry::new_file(path, 0o644))
                    .await?;
            }
            Command::Rm { path } => {
                store.delete_entry(ctx, &FullPath::from(path)).await?;
            }
            Command::RmChildren { dir } => {
                store
                    .delete_folder_children(ctx, &FullPath::from(dir))
                    .await?;
            }
            Command::KvGet { key } => {
                let value = store.kv_get(ctx, key.as_bytes()).await?;
                writeln!(out, "{}", String::from_utf8_lossy(&value))?;
            }
            Command::KvPut { key, value } => {
                store.kv_put(ctx, key.as_bytes(), value.as_bytes()).await?;
            }
            Command::KvRm { key } => {
                store.kv_delete(ctx, key.as_bytes()).await?;
            }
        }
        Ok(())
    }
}
