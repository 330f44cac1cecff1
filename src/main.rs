//! The `simplefs` shell: a REPL for creating, mounting, and poking at a
//! SimpleFS image stored in a single regular file.

use simplefs::disk::{Disk, BLOCK_SIZE};
use simplefs::error::Error;
use simplefs::fs::FileSystem;
use std::env;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

/// Default geometry for an image created because the given path did not
/// exist yet.
const DEFAULT_BLOCKS: u32 = 1024;

/// Writes an error to stderr, then exits. Used only for setup failures that
/// leave the shell nothing to do.
fn error<M: fmt::Display>(bin: &str, msg: M) -> ! {
    eprintln!("{bin}: error: {msg}");
    exit(1);
}

/// Writes a command failure to stderr. Unlike `error`, this never exits:
/// the shell loop must keep reading commands after a bad one.
fn fail<M: fmt::Display>(context: &str, msg: M) {
    eprintln!("simplefs: {context}: {msg}");
}

struct Args {
    image_path: PathBuf,
    blocks: Option<u32>,
}

fn parse_args(mut args: env::ArgsOs) -> Args {
    args.next();
    let image_path = args.next().map(PathBuf::from).unwrap_or_else(|| {
        error("simplefs", "usage: simplefs <image-path> [blocks]");
    });
    let blocks = args.next().map(|a| {
        a.to_str()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or_else(|| error("simplefs", "blocks must be a positive integer"))
    });
    Args { image_path, blocks }
}

/// Opens the disk at `path`, creating and formatting it with `blocks`
/// blocks (or `DEFAULT_BLOCKS` if unset) when it does not already exist.
fn open_or_create(path: &Path, blocks: Option<u32>) -> Disk {
    if path.exists() {
        if blocks.is_some() {
            fail(
                "open",
                format_args!("{}: already exists, ignoring block count", path.display()),
            );
        }
        Disk::open_existing(path).unwrap_or_else(|e| {
            error("simplefs", format_args!("{}: {e}", path.display()));
        })
    } else {
        let blocks = blocks.unwrap_or(DEFAULT_BLOCKS);
        let mut disk = Disk::open(path, blocks).unwrap_or_else(|e| {
            error("simplefs", format_args!("{}: {e}", path.display()));
        });
        FileSystem::format(&mut disk).unwrap_or_else(|e| {
            error(
                "simplefs",
                format_args!("{}: failed to format: {e}", path.display()),
            );
        });
        println!("{}: created and formatted with {blocks} blocks", path.display());
        disk
    }
}

/// The shell's mount state: either an unmounted disk, or a mounted file
/// system. An enum rather than an `Option<FileSystem>` paired with a
/// separately-tracked `Disk`, so there is never a window where the shell
/// holds neither.
enum State {
    Unmounted(Disk),
    Mounted(FileSystem),
}

impl State {
    fn mount(&mut self, placeholder_path: &Path) {
        let disk = match std::mem::replace(self, State::Unmounted(placeholder(placeholder_path))) {
            State::Mounted(fs) => {
                fail("mount", Error::AlreadyMounted);
                *self = State::Mounted(fs);
                return;
            }
            State::Unmounted(disk) => disk,
        };
        match FileSystem::mount(disk) {
            Ok(fs) => *self = State::Mounted(fs),
            Err((disk, e)) => {
                fail("mount", e);
                *self = State::Unmounted(disk);
            }
        }
    }

    fn unmount(&mut self, placeholder_path: &Path) {
        match std::mem::replace(self, State::Unmounted(placeholder(placeholder_path))) {
            State::Mounted(fs) => *self = State::Unmounted(fs.unmount()),
            State::Unmounted(disk) => {
                fail("unmount", Error::NotMounted);
                *self = State::Unmounted(disk);
            }
        }
    }

    fn format(&mut self) {
        match self {
            State::Unmounted(disk) => {
                if let Err(e) = FileSystem::format(disk) {
                    fail("format", e);
                }
            }
            State::Mounted(_) => fail("format", Error::AlreadyMounted),
        }
    }

    fn debug(&mut self) {
        let result = match self {
            State::Unmounted(disk) => FileSystem::debug(disk),
            State::Mounted(fs) => FileSystem::debug(fs.disk_mut()),
        };
        if let Err(e) = result {
            fail("debug", e);
        }
    }

    fn with_mounted<F: FnOnce(&mut FileSystem)>(&mut self, context: &str, f: F) {
        match self {
            State::Mounted(fs) => f(fs),
            State::Unmounted(_) => fail(context, Error::NotMounted),
        }
    }
}

/// A throwaway empty disk used only to satisfy `mem::replace` for the
/// instant between taking the old state apart and putting the new one
/// back. Never observed by a command: every branch overwrites it before
/// returning to the shell loop.
fn placeholder(path: &Path) -> Disk {
    Disk::open(path, 1).unwrap_or_else(|e| error("simplefs", format_args!("internal: {e}")))
}

fn do_create(fs: &mut FileSystem) {
    match fs.create() {
        Ok(i) => println!("created inode {i}"),
        Err(e) => fail("create", e),
    }
}

fn do_remove(fs: &mut FileSystem, arg: Option<&str>) {
    let Some(i) = parse_inode(arg) else {
        fail("remove", "usage: remove <inode>");
        return;
    };
    match fs.remove(i) {
        Ok(()) => println!("removed inode {i}"),
        Err(e) => fail("remove", e),
    }
}

fn do_stat(fs: &mut FileSystem, arg: Option<&str>) {
    let Some(i) = parse_inode(arg) else {
        fail("stat", "usage: stat <inode>");
        return;
    };
    match fs.stat(i) {
        Ok(size) => println!("inode {i}: {size} bytes"),
        Err(e) => fail("stat", e),
    }
}

fn do_cat(fs: &mut FileSystem, arg: Option<&str>) {
    let Some(i) = parse_inode(arg) else {
        fail("cat", "usage: cat <inode>");
        return;
    };
    let mut offset = 0u32;
    let mut buf = [0u8; BLOCK_SIZE];
    let stdout = io::stdout();
    let mut out = stdout.lock();
    loop {
        match fs.read(i, &mut buf, offset) {
            Ok(0) => break,
            Ok(n) => {
                if out.write_all(&buf[..n]).is_err() {
                    fail("cat", "failed to write to stdout");
                    break;
                }
                offset += n as u32;
            }
            Err(e) => {
                fail("cat", e);
                break;
            }
        }
    }
}

fn do_copyin(fs: &mut FileSystem, args: &[&str]) {
    let [host_path, inode_arg] = *args else {
        fail("copyin", "usage: copyin <host-path> <inode>");
        return;
    };
    let Some(i) = parse_inode(Some(inode_arg)) else {
        fail("copyin", "usage: copyin <host-path> <inode>");
        return;
    };
    let mut file = match File::open(host_path) {
        Ok(f) => f,
        Err(e) => {
            fail("copyin", format_args!("{host_path}: {e}"));
            return;
        }
    };
    let mut offset = 0u32;
    let mut buf = [0u8; BLOCK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                fail("copyin", format_args!("{host_path}: {e}"));
                return;
            }
        };
        match fs.write(i, &buf[..n], offset) {
            Ok(written) if written < n => {
                offset += written as u32;
                fail("copyin", Error::NoFreeBlock);
                println!("copied {offset} bytes into inode {i} (truncated)");
                return;
            }
            Ok(written) => offset += written as u32,
            Err(e) => {
                fail("copyin", e);
                return;
            }
        }
    }
    println!("copied {offset} bytes into inode {i}");
}

fn do_copyout(fs: &mut FileSystem, args: &[&str]) {
    let [inode_arg, host_path] = *args else {
        fail("copyout", "usage: copyout <inode> <host-path>");
        return;
    };
    let Some(i) = parse_inode(Some(inode_arg)) else {
        fail("copyout", "usage: copyout <inode> <host-path>");
        return;
    };
    let mut file = match File::create(host_path) {
        Ok(f) => f,
        Err(e) => {
            fail("copyout", format_args!("{host_path}: {e}"));
            return;
        }
    };
    let mut offset = 0u32;
    let mut buf = [0u8; BLOCK_SIZE];
    loop {
        match fs.read(i, &mut buf, offset) {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = file.write_all(&buf[..n]) {
                    fail("copyout", format_args!("{host_path}: {e}"));
                    return;
                }
                offset += n as u32;
            }
            Err(e) => {
                fail("copyout", e);
                return;
            }
        }
    }
    println!("copied {offset} bytes out of inode {i}");
}

fn parse_inode(arg: Option<&str>) -> Option<u32> {
    arg?.parse().ok()
}

fn print_help() {
    println!("commands:");
    println!("  debug                         show superblock and inode layout");
    println!("  format                        format the disk (must be unmounted)");
    println!("  mount                         mount the file system");
    println!("  unmount                       unmount the file system");
    println!("  create                        allocate a new inode");
    println!("  remove <inode>                free an inode and its blocks");
    println!("  stat <inode>                  print an inode's size");
    println!("  cat <inode>                   print an inode's contents to stdout");
    println!("  copyin <host-path> <inode>    copy a host file into an inode");
    println!("  copyout <inode> <host-path>   copy an inode out to a host file");
    println!("  help                          show this message");
    println!("  exit, quit                    leave the shell");
}

fn main() {
    let args = parse_args(env::args_os());
    let placeholder_path =
        std::env::temp_dir().join(format!("simplefs-placeholder-{}", std::process::id()));
    let disk = open_or_create(&args.image_path, args.blocks);
    let mut state = State::Unmounted(disk);

    let stdin = io::stdin();
    print!("simplefs> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                fail("shell", e);
                break;
            }
        };
        let mut words = line.split_whitespace();
        match words.next() {
            None => {}
            Some("debug") => state.debug(),
            Some("format") => state.format(),
            Some("mount") => state.mount(&placeholder_path),
            Some("unmount") => state.unmount(&placeholder_path),
            Some("create") => state.with_mounted("create", do_create),
            Some("remove") => {
                let arg = words.next();
                state.with_mounted("remove", |fs| do_remove(fs, arg));
            }
            Some("stat") => {
                let arg = words.next();
                state.with_mounted("stat", |fs| do_stat(fs, arg));
            }
            Some("cat") => {
                let arg = words.next();
                state.with_mounted("cat", |fs| do_cat(fs, arg));
            }
            Some("copyin") => {
                let rest: Vec<&str> = words.collect();
                state.with_mounted("copyin", |fs| do_copyin(fs, &rest));
            }
            Some("copyout") => {
                let rest: Vec<&str> = words.collect();
                state.with_mounted("copyout", |fs| do_copyout(fs, &rest));
            }
            Some("help") => print_help(),
            Some("exit" | "quit") => break,
            Some(other) => fail(other, "unknown command (try `help`)"),
        }
        print!("simplefs> ");
        let _ = io::stdout().flush();
    }

    match state {
        State::Mounted(fs) => fs.unmount().close(),
        State::Unmounted(disk) => disk.close(),
    }
    let _ = std::fs::remove_file(&placeholder_path);
}
