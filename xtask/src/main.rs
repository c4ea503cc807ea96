use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, ensure, Context, Error, Result};
use xshell::{cmd, pushd, pushenv};

enum Mode {
    Overwrite,
    Verify,
}

enum Command {
    PreCommit,
    InstallPreCommit,
    Ci(CiStep),
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-commit" => Ok(Command::PreCommit),
            "install-pre-commit" => Ok(Command::InstallPreCommit),
            "ci" => Ok(Command::Ci(CiStep::All)),
            "check-fmt" => Ok(Command::Ci(CiStep::CheckFmt)),
            "lint" => Ok(Command::Ci(CiStep::Lint)),
            "test" => Ok(Command::Ci(CiStep::Test)),
            _ => bail!("Unknown subcommand: {}", s),
        }
    }
}

enum CiStep {
    All,
    CheckFmt,
    Lint,
    Test,
}

fn main() -> Result<()> {
    if env::args().next().map(|it| it.contains("pre-commit")) == Some(true) {
        run_precommit().context("failed to run pre-commit hook")?;
        return Ok(());
    }

    let args: Vec<String> = env::args().collect();
    ensure!(
        args.len() == 2,
        "expected exactly 1 subcommand, found {}: {:?}",
        args.len().saturating_sub(1),
        args.get(1..).unwrap_or_default(),
    );
    match Command::from_str(&args[1])? {
        Command::PreCommit => {
            run_precommit().context("failed to run pre-commit hook")?
        },
        Command::InstallPreCommit => run_install_precommit()
            .context("failed to install pre-commit hook")?,
        Command::Ci(step) => run_ci(step)?,
    }
    Ok(())
}

fn run_ci(step: CiStep) -> Result<()> {
    let _dir = pushd(project_root())?;
    match step {
        CiStep::All => {
            run_rustfmt(Mode::Verify).context("formatting check failed")?;
            run_clippy().context("lint failed")?;
            run_tests().context("tests failed")?;
        },
        CiStep::CheckFmt => run_rustfmt(Mode::Verify)?,
        CiStep::Lint => run_clippy()?,
        CiStep::Test => run_tests()?,
    }
    Ok(())
}

fn run_clippy() -> Result<()> {
    cmd!("cargo clippy --workspace --all-targets -- -D warnings").run()?;
    Ok(())
}

fn run_tests() -> Result<()> {
    cmd!("cargo test --workspace --verbose").run()?;
    // The HTTP source is optional, make sure the crate still works without it.
    cmd!("cargo test -p fedmeta --no-default-features").run()?;
    Ok(())
}

fn run_precommit() -> Result<()> {
    run_rustfmt(Mode::Overwrite)?;

    let diff =
        cmd!("git diff --diff-filter=MAR --name-only --cached").read()?;

    let root = project_root();
    for line in diff.lines() {
        let file = root.join(line);
        cmd!("git update-index --add {file}").run()?;
    }

    Ok(())
}

fn run_install_precommit() -> Result<()> {
    let hook_path: PathBuf =
        format!("./.git/hooks/pre-commit{}", env::consts::EXE_SUFFIX).into();
    let me = env::current_exe()?;
    fs::copy(me, hook_path)?;
    Ok(())
}

fn project_root() -> PathBuf {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")
        .unwrap_or_else(|_| env!("CARGO_MANIFEST_DIR").to_owned());
    Path::new(&manifest_dir)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn run_rustfmt(mode: Mode) -> Result<()> {
    let _dir = pushd(project_root())?;
    // Some of the directives in rustfmt.toml are nightly only.
    let _e = pushenv("RUSTUP_TOOLCHAIN", "nightly");
    ensure_rustfmt()?;
    let check: &[&str] = match mode {
        Mode::Overwrite => &[][..],
        Mode::Verify => &["--", "--check"],
    };
    cmd!("cargo fmt {check...}").run()?;
    Ok(())
}

fn ensure_rustfmt() -> Result<()> {
    let out = cmd!("cargo fmt -- --version").read()?;
    let toolchain = env::var("RUSTUP_TOOLCHAIN")?;
    if !out.contains(&toolchain) {
        bail!(
            "Failed to run rustfmt from toolchain '{}'. Please run `rustup \
             component add rustfmt --toolchain {}` to install it.",
            toolchain,
            toolchain,
        )
    }
    Ok(())
}
