//! Frame-level integration tests against the null backend.
//!
//! Tests are parameterized using `rstest` to run the same frame shape over
//! several attachment formats and swapchain configurations. The null
//! recorder's op log stands in for readback validation.

use rstest::rstest;

use framegraph::backend::{
    ImageDescriptor, ImageUsage, NullDevice, NullRecorder, RecordedOp, SwapchainDescriptor,
};
use framegraph::resource::Residency;
use framegraph::scene::SceneData;
use framegraph::scheduler::GraphScheduler;
use framegraph::types::{ClearValue, Extent3d, Format, ImageLayout, LoadOp, StoreOp};

fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The first touch of a freshly mounted attachment must transition it out
/// of `Undefined` into the layout its attachment role requires.
#[rstest]
#[case::color(Format::Rgba8Unorm, ImageLayout::ColorAttachment)]
#[case::hdr_color(Format::Rgba16Float, ImageLayout::ColorAttachment)]
#[case::depth(Format::Depth32Float, ImageLayout::DepthStencilAttachment)]
#[case::depth_stencil(Format::Depth24PlusStencil8, ImageLayout::DepthStencilAttachment)]
fn test_first_attachment_use_transitions_from_undefined(
    #[case] format: Format,
    #[case] expected: ImageLayout,
) {
    init_test_logging();
    let device = NullDevice::new();
    let mut recorder = NullRecorder::new();
    let mut scheduler = GraphScheduler::new();
    let scene = SceneData::new();

    let is_depth = expected == ImageLayout::DepthStencilAttachment;
    let usage = if is_depth {
        ImageUsage::DEPTH_STENCIL_ATTACHMENT
    } else {
        ImageUsage::COLOR_ATTACHMENT
    };
    scheduler.resources_mut().add_image(
        "target",
        ImageDescriptor::new_2d(256, 256, format, usage),
        Residency::Persistent,
    );
    let pass = scheduler.graph_mut().add_render_pass("main");
    if is_depth {
        pass.add_depth_stencil(
            "target",
            LoadOp::Clear,
            StoreOp::Store,
            ClearValue::DepthStencil {
                depth: 1.0,
                stencil: 0,
            },
        );
    } else {
        pass.add_color(
            "target",
            LoadOp::Clear,
            StoreOp::Store,
            ClearValue::Color([0.0; 4]),
        );
    }

    scheduler.execute(&device, &mut recorder, &scene).unwrap();

    let transition = recorder
        .ops()
        .iter()
        .find_map(|op| match op {
            RecordedOp::ImageBarrier {
                old_layout,
                new_layout,
                ..
            } => Some((*old_layout, *new_layout)),
            _ => None,
        })
        .expect("layout transition recorded");
    assert_eq!(transition, (ImageLayout::Undefined, expected));
}

/// Presents cycle through the swapchain's images and wrap back to the
/// first one after `image_count` frames.
#[rstest]
#[case::double_buffered(2)]
#[case::triple_buffered(3)]
fn test_swapchain_presents_wrap_around_image_count(#[case] image_count: u32) {
    init_test_logging();
    let device = NullDevice::new();
    let mut scheduler = GraphScheduler::new();
    let scene = SceneData::new();

    let mut presented = Vec::new();
    for _ in 0..image_count + 1 {
        let mut recorder = NullRecorder::new();
        scheduler.resources_mut().import_swapchain(
            "backbuffer",
            SwapchainDescriptor {
                label: None,
                extent: Extent3d::new_2d(640, 480),
                format: Format::Bgra8Unorm,
                image_count,
            },
        );
        scheduler.graph_mut().add_render_pass("main").add_color(
            "backbuffer",
            LoadOp::Clear,
            StoreOp::Store,
            ClearValue::Color([0.0; 4]),
        );
        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        let image = recorder
            .ops()
            .iter()
            .find_map(|op| match op {
                RecordedOp::ImageBarrier {
                    image,
                    new_layout: ImageLayout::Present,
                    ..
                } => Some(*image),
                _ => None,
            })
            .expect("present transition recorded");
        presented.push(image);
    }

    // Every image was presented exactly once before the wrap.
    let mut distinct = presented[..image_count as usize].to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), image_count as usize);
    // Frame `image_count` reuses frame 0's image.
    assert_eq!(presented[0], presented[image_count as usize]);
}
