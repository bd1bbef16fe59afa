//! Effect-chain construction and wiring tests.
//!
//! Everything here needs a real GPU adapter, so the tests are ignored by
//! default; run them with `cargo test -- --ignored` on a machine with one.

use wgpu_sprites::renderer::postprocess::{EffectChain, EffectKind};
use wgpu_sprites::renderer::{Texture, RENDER_FORMAT};

fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}

#[test]
#[ignore]
fn chain_builds_every_kind_and_reports_targets() {
    let (device, queue) = headless_device().expect("GPU adapter");
    let overlay = Texture::empty(&device, 16, 16, RENDER_FORMAT, Some("Overlay"));

    let mut chain = EffectChain::new(device, queue, 64, 64);
    for kind in EffectKind::ALL {
        chain.push(kind, Some(&overlay)).expect("effect builds");
    }

    assert_eq!(chain.len(), EffectKind::ALL.len());
    // The sprite pass feeds the first effect's input surface.
    assert!(chain.first_target().is_some());
    // A bloom effect was built, so its brightness surface is exposed for
    // the sprite pass's second color attachment.
    assert!(chain.brightness_target().is_some());
    // Effect lookup past the end is a configuration error.
    assert!(chain.get(EffectKind::ALL.len()).is_err());
    assert!(chain.get(0).is_ok());
}

#[test]
#[ignore]
fn unknown_key_is_skipped_without_growing_the_chain() {
    let (device, queue) = headless_device().expect("GPU adapter");

    let mut chain = EffectChain::new(device, queue, 64, 64);
    chain.build_from_keys(
        &["grayscale".into(), "neonFX".into(), "blur".into()],
        None,
    );

    // The bad key is reported and skipped; the rest of the chain came up.
    assert_eq!(chain.len(), 2);
}

#[test]
#[ignore]
fn combine_without_overlay_is_isolated_to_that_effect() {
    let (device, queue) = headless_device().expect("GPU adapter");

    let mut chain = EffectChain::new(device, queue, 64, 64);
    chain.build_from_keys(&["combine".into(), "wobble".into()], None);

    assert_eq!(chain.len(), 1);
}

#[test]
#[ignore]
fn chain_executes_with_the_last_effect_targeting_the_surface() {
    let (device, queue) = headless_device().expect("GPU adapter");
    let presentation = Texture::empty(&device, 64, 64, RENDER_FORMAT, Some("Presentation"));

    let mut chain = EffectChain::new(device.clone(), queue.clone(), 64, 64);
    chain.build_from_keys(&["grayscale".into(), "blur".into(), "wobble".into()], None);
    assert_eq!(chain.len(), 3);

    // Effect i draws into effect i+1's declared input; only the last draw
    // targets the presentation surface. Executing the chain end to end
    // must record and submit cleanly.
    chain.execute(&presentation.view);
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .expect("queue drained");
}
