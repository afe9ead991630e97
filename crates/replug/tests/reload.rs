//! End-to-end reload tests against real plugin images.
//!
//! The fixture cdylibs are compiled on demand into a dedicated target
//! directory, staged at a temporary path, and swapped on disk between
//! generations the way a deployment pipeline would.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::c_void;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use replug::{LifecycleOp, Module};
use replug_probe::HostProbe;

/// Builds both fixture images once per test binary and returns the
/// directory holding the compiled artifacts.
fn fixture_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let workspace_root = manifest_dir
            .ancestors()
            .nth(2)
            .expect("workspace root above crates/replug")
            .to_path_buf();
        // A separate target dir keeps the nested build off the outer
        // invocation's lock.
        let target_dir = workspace_root.join("target").join("fixture-images");

        let status = Command::new(env!("CARGO"))
            .current_dir(&workspace_root)
            .env("CARGO_TARGET_DIR", &target_dir)
            .args(["build", "-p", "replug-counter-v1", "-p", "replug-counter-v2"])
            .status()
            .expect("spawn cargo build for fixture images");
        assert!(status.success(), "fixture image build failed");

        target_dir.join("debug")
    })
}

fn artifact(name: &str) -> PathBuf {
    fixture_dir().join(format!("{DLL_PREFIX}{name}{DLL_SUFFIX}"))
}

/// Replaces whatever lives at `dst` with the image at `src`, through a
/// rename so the path never points at a half-written or still-open file.
fn stage(src: &Path, dst: &Path) {
    let staged = dst.with_extension("staged");
    fs::copy(src, &staged).expect("copy fixture image");
    fs::rename(&staged, dst).expect("swap fixture image into place");
}

fn op(op: LifecycleOp) -> u32 {
    op as u32
}

#[test]
fn reload_transplants_matching_state() {
    let dir = tempfile::tempdir().expect("create temp plugin dir");
    let image = dir.path().join(format!("counter_plugin{DLL_SUFFIX}"));
    stage(&artifact("replug_counter_v1"), &image);

    let probe: *mut HostProbe = Box::into_raw(Box::new(HostProbe::new()));
    let mut module = Module::load(&image, probe.cast::<c_void>());

    let seen = unsafe { *probe };
    assert_eq!(seen.ops(), [op(LifecycleOp::Load)]);
    assert_eq!(seen.counter, 7);
    assert_eq!(seen.dropped, 11);
    assert_eq!(seen.ticks, 1);
    assert_eq!(
        module.var_names(),
        ["COUNTER", "DROPPED", "WIDENED", "TICKS"],
        "generation 1 registry"
    );
    assert_eq!(
        module.var_bytes("COUNTER"),
        Some(7u32.to_ne_bytes().to_vec())
    );

    stage(&artifact("replug_counter_v2"), &image);
    module.reload();

    let seen = unsafe { *probe };
    assert_eq!(
        seen.ops(),
        [
            op(LifecycleOp::Load),
            op(LifecycleOp::BeforeReload),
            op(LifecycleOp::AfterReload),
        ],
        "one reload delivers exactly before-reload then after-reload"
    );

    // Same name and size: the old value survives the swap.
    assert_eq!(seen.counter, 7);
    // Present only in the new image: keeps its own default.
    assert_eq!(seen.added, 42);
    // Same name, different size: unmatched, keeps the new default.
    assert_eq!(seen.widened, 5);
    // Present only in the old image: gone without a trace. The registry
    // placeholder in generation 2 is invisible to the walk.
    assert_eq!(module.var_names(), ["COUNTER", "ADDED", "WIDENED"]);
    assert_eq!(module.var_bytes("DROPPED"), None);
    assert_eq!(
        module.var_bytes("COUNTER"),
        Some(7u32.to_ne_bytes().to_vec())
    );
    assert_eq!(
        module.var_bytes("WIDENED"),
        Some(5u64.to_ne_bytes().to_vec())
    );

    module.unload();
    let seen = unsafe { *probe };
    assert_eq!(
        seen.ops(),
        [
            op(LifecycleOp::Load),
            op(LifecycleOp::BeforeReload),
            op(LifecycleOp::AfterReload),
            op(LifecycleOp::Unload),
        ],
        "load and unload each delivered exactly once"
    );
    assert_eq!(seen.op_counts, [1, 1, 1, 1]);

    drop(unsafe { Box::from_raw(probe) });
}

#[test]
fn reload_onto_identical_bytes_keeps_state() {
    let dir = tempfile::tempdir().expect("create temp plugin dir");
    let image = dir.path().join(format!("counter_plugin{DLL_SUFFIX}"));
    stage(&artifact("replug_counter_v1"), &image);

    let probe: *mut HostProbe = Box::into_raw(Box::new(HostProbe::new()));
    let mut module = Module::load(&image, probe.cast::<c_void>());

    // Same generation staged again under a fresh inode.
    stage(&artifact("replug_counter_v1"), &image);
    module.reload();

    let seen = unsafe { *probe };
    assert_eq!(seen.counter, 7);
    // Load, BeforeReload and AfterReload each bumped the transplanted
    // count; a fresh default would have left it at 1.
    assert_eq!(seen.ticks, 3);
    assert_eq!(seen.op_counts[LifecycleOp::BeforeReload as usize], 1);
    assert_eq!(seen.op_counts[LifecycleOp::AfterReload as usize], 1);

    module.unload();
    drop(unsafe { Box::from_raw(probe) });
}
