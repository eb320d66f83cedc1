use super::*;
use crate::capture::frame::decode_jpeg;

const RES: Resolution = Resolution {
    width: 80,
    height: 48,
};

fn luma(frame: &crate::capture::frame::FrameImage) -> Vec<u8> {
    frame
        .data
        .chunks_exact(3)
        .map(|px| ((u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2])) / 3) as u8)
        .collect()
}

fn url(frame: u64) -> Url {
    Url::parse(&format!("http://localhost:5173/dors.glb/Run/30/0/{frame}")).unwrap()
}

#[test]
fn marker_survives_jpeg_round_trip() {
    let mut browser = SyntheticBrowser::new(RES);
    let mut surface = browser.open_surface().unwrap();
    for frame in [0u64, 1, 2, 45, 119, 512, 1023] {
        surface.navigate(&url(frame)).unwrap();
        surface.wait_ready("#done", Duration::from_secs(1)).unwrap();
        let decoded = decode_jpeg(&surface.capture_jpeg(100).unwrap()).unwrap();
        assert_eq!(decoded.resolution(), RES);
        assert_eq!(
            read_marker(&luma(&decoded), RES.width, RES.height),
            Some(frame)
        );
    }
}

#[test]
fn navigations_are_logged_across_surfaces() {
    let mut browser = SyntheticBrowser::new(RES);
    {
        let mut a = browser.open_surface().unwrap();
        a.navigate(&url(0)).unwrap();
    }
    {
        let mut b = browser.open_surface().unwrap();
        b.navigate(&url(1)).unwrap();
    }
    assert_eq!(browser.navigations().len(), 2);
    assert!(browser.navigations()[1].ends_with("/1"));
}

#[test]
fn stalled_frame_times_out() {
    let mut browser = SyntheticBrowser::new(RES).stall_at("Run", FrameIndex(3));
    let mut surface = browser.open_surface().unwrap();
    surface.navigate(&url(2)).unwrap();
    surface.wait_ready("#done", Duration::from_millis(5)).unwrap();
    surface.navigate(&url(3)).unwrap();
    let err = surface
        .wait_ready("#done", Duration::from_millis(5))
        .unwrap_err();
    assert!(matches!(err, AnimcapError::RenderTimeout(_)));
}

#[test]
fn waiting_before_navigation_fails() {
    let mut browser = SyntheticBrowser::new(RES);
    let mut surface = browser.open_surface().unwrap();
    assert!(matches!(
        surface.wait_ready("#done", Duration::from_millis(5)),
        Err(AnimcapError::RenderTimeout(_))
    ));
}

#[test]
fn read_marker_rejects_short_buffers() {
    assert_eq!(read_marker(&[0u8; 10], RES.width, RES.height), None);
}
