use log::{error, info};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Fire-and-forget launch of an external helper. The child starts its own
/// session so it outlives us, and exec drops the inherited X socket (libxcb
/// opens it close-on-exec). Nobody waits on the child.
pub fn spawn(argv: &[&str]) -> std::io::Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(());
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    match cmd.spawn() {
        Ok(child) => {
            info!("Spawned {program} (pid {})", child.id());
            Ok(())
        }
        Err(e) => {
            error!("Failed to spawn {program}: {e:?}");
            Err(e)
        }
    }
}
