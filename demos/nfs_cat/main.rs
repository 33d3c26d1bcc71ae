use std::io::{self, Write};

use anyhow::{bail, Context};
use nfs_boot::{FileType, MountOptions, NfsMount};

const USAGE: &str = "Usage: nfscat [-o OPTIONS] [--root-arg] <SERVER:/EXPORT> [PATH]\n\
                     \n\
                     Lists PATH when it is a directory, prints the target of a symlink,\n\
                     and copies anything else to stdout.\n\
                     \n\
                     Options:\n\
                       -o OPTIONS   Mount options, e.g. port=2049,mountport=635\n\
                       --root-arg   Print the kernel root= argument for the export\n\
                       -h, --help   Show this help and exit";

/// Mounts an export over UDP and shows one path from it.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let mut options = MountOptions::default();
    let mut root_arg = false;
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" => {
                let value = args.next().context("-o needs a value")?;
                options = MountOptions::parse(&value)?;
            }
            "--root-arg" => root_arg = true,
            "--help" | "-h" => {
                eprintln!("{USAGE}");
                return Ok(());
            }
            _ if arg.starts_with('-') => bail!("unknown flag: {arg}\n\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let (source, path) = match positional.as_slice() {
        [source] => (source.as_str(), "/"),
        [source, path] => (source.as_str(), path.as_str()),
        _ => bail!("{USAGE}"),
    };

    let mut nfs =
        NfsMount::mount_source(source, options).with_context(|| format!("cannot mount {source}"))?;
    if root_arg {
        println!("{}", nfs.kernel_root_arg());
    }

    let attrs = nfs.symlink_metadata(path).with_context(|| format!("cannot stat {path}"))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match attrs.file_type {
        FileType::Directory => {
            for entry in nfs.read_dir(path)? {
                let entry = entry.with_context(|| format!("cannot list {path}"))?;
                writeln!(out, "{}", entry.name_lossy())?;
            }
        }
        FileType::Symlink => writeln!(out, "{}", nfs.readlink(path)?)?,
        _ => {
            let mut file = nfs.open(path).with_context(|| format!("cannot open {path}"))?;
            io::copy(&mut file, &mut out).with_context(|| format!("cannot read {path}"))?;
        }
    }
    out.flush()?;
    drop(out);

    nfs.unmount().context("unmount failed")?;
    Ok(())
}
