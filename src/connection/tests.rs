//! Receiver state machine tests
//!
//! Every test runs on paused time with a [`ScriptedTransport`], so backoff
//! and read timeouts elapse instantly and connect instants are exact.

use futures::StreamExt;
use std::time::Duration;

use crate::codec::HeaderShape;
use crate::test_utils::{
    Attempt, ScriptedTransport, Step, depth_frame, depth_header, depth_payload, frame_bytes,
};
use crate::types::{ByteOrder, ConnectionState, FrameHeader, PixelBuffer};
use crate::{FrameStream, HoloStream, StreamConfig, StreamError, StreamHandle};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("holostream=debug")
        .with_test_writer()
        .try_init();
}

fn config() -> StreamConfig {
    StreamConfig::new("headset.test", 10081, HeaderShape::minimal())
}

fn subscribe(config: StreamConfig, transport: &ScriptedTransport) -> (StreamHandle, FrameStream) {
    HoloStream::subscribe_with_transport(config, transport.clone()).expect("valid config")
}

async fn take_timestamps(frames: &mut FrameStream, count: usize) -> Vec<i64> {
    frames.take(count).map(|f| f.timestamp()).collect().await
}

#[tokio::test(start_paused = true)]
async fn three_failed_connects_then_success_spaced_by_backoff() {
    init_tracing();
    let transport = ScriptedTransport::new([
        Attempt::Refuse,
        Attempt::Refuse,
        Attempt::Refuse,
        Attempt::Accept(vec![Step::Bytes(depth_frame(1000, 4, 2)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config(), &transport);

    let first = frames.next().await.expect("frame after fourth connect");
    assert_eq!(first.timestamp(), 1000);

    let times = transport.connect_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(3));
    }

    handle.cancel();
    let stats = handle.join().await.expect("receiver finished");
    assert_eq!(stats.connect_failures, 3);
    assert_eq!(stats.consecutive_connect_failures, 0);
    assert_eq!(stats.frames_yielded, 1);
    assert_eq!(stats.state, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn close_mid_payload_reconnects_without_backoff_and_reframes() {
    init_tracing();
    let partial = depth_frame(2, 4, 2);
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![
            Step::Bytes(depth_frame(1, 4, 2)),
            Step::Bytes(partial[..24 + 5].to_vec()),
            Step::Close,
        ]),
        Attempt::Accept(vec![
            Step::Bytes(depth_frame(3, 4, 2)),
            Step::Bytes(depth_frame(4, 4, 2)),
            Step::Stall,
        ]),
    ]);
    let (handle, mut frames) = subscribe(config(), &transport);

    assert_eq!(take_timestamps(&mut frames, 3).await, vec![1, 3, 4]);

    let times = transport.connect_times();
    assert_eq!(times[1] - times[0], Duration::ZERO);

    handle.cancel();
    let stats = handle.join().await.expect("receiver finished");
    assert_eq!(stats.reconnects, 1);
    assert_eq!(stats.connect_failures, 0);
    assert!(stats.last_error.as_deref().is_some_and(|e| e.contains("after 5 of 16 bytes")));
    // Drained once, then closed on cancel.
    assert_eq!(transport.close_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn short_reads_accumulate_into_whole_frames() {
    let mut bytes = depth_frame(10, 4, 2);
    bytes.extend(depth_frame(11, 4, 2));
    let transport = ScriptedTransport::new([Attempt::Accept(vec![
        Step::Chunked(bytes, 5),
        Step::Stall,
    ])]);
    let (handle, mut frames) = subscribe(config(), &transport);

    let first = frames.next().await.expect("first frame");
    let second = frames.next().await.expect("second frame");
    assert_eq!((first.timestamp(), second.timestamp()), (10, 11));
    assert_eq!(second.pixels.shape(), (2, 4, 1));
    assert_eq!(second.pixels.depth_at(3, 1), Some(7));
    assert_eq!(transport.connect_count(), 1);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn duplicate_timestamp_is_consumed_and_discarded() {
    let mut duplicate_payload = depth_payload(4, 2);
    duplicate_payload.reverse();
    let duplicate = frame_bytes(
        &depth_header(1000, 4, 2),
        &duplicate_payload,
        &HeaderShape::minimal(),
        ByteOrder::Little,
    );
    let transport = ScriptedTransport::new([Attempt::Accept(vec![
        Step::Bytes(depth_frame(1000, 4, 2)),
        Step::Bytes(duplicate),
        Step::Bytes(depth_frame(1001, 4, 2)),
        Step::Stall,
    ])]);
    let (handle, mut frames) = subscribe(config(), &transport);

    let received: Vec<_> = (&mut frames).take(2).collect().await;
    assert_eq!(received[0].timestamp(), 1000);
    assert_eq!(received[0].pixels.depth_at(0, 0), Some(0));
    assert_eq!(received[1].timestamp(), 1001);
    assert_eq!(received[1].pixels.depth_at(0, 0), Some(0));

    handle.cancel();
    let stats = handle.join().await.expect("receiver finished");
    assert_eq!(stats.duplicates_discarded, 1);
    assert_eq!(stats.frames_yielded, 2);
    assert_eq!(stats.reconnects, 0);
}

#[tokio::test(start_paused = true)]
async fn previous_timestamp_resets_on_reconnect() {
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![Step::Bytes(depth_frame(500, 1, 1)), Step::Close]),
        Attempt::Accept(vec![Step::Bytes(depth_frame(500, 1, 1)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config(), &transport);

    assert_eq!(take_timestamps(&mut frames, 2).await, vec![500, 500]);
    assert_eq!(handle.stats().duplicates_discarded, 0);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn zero_length_payload_yields_empty_frame() {
    let header = FrameHeader {
        timestamp: 1,
        image_width: 4,
        image_height: 2,
        pixel_stride: 2,
        payload_length: Some(0),
        ..Default::default()
    };
    let empty = frame_bytes(&header, &[], &HeaderShape::minimal(), ByteOrder::Little);
    let transport = ScriptedTransport::new([Attempt::Accept(vec![
        Step::Bytes(empty),
        Step::Bytes(depth_frame(2, 4, 2)),
        Step::Stall,
    ])]);
    let (handle, mut frames) = subscribe(config(), &transport);

    let first = frames.next().await.expect("empty frame");
    assert_eq!(first.pixels, PixelBuffer::Empty);
    assert_eq!(first.header.image_width, 4);
    let second = frames.next().await.expect("next frame");
    assert_eq!(second.timestamp(), 2);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn decode_error_forces_reconnect() {
    let bad = FrameHeader {
        timestamp: 1,
        image_width: 2,
        image_height: 1,
        pixel_stride: 5,
        payload_length: Some(10),
        ..Default::default()
    };
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![
            Step::Bytes(frame_bytes(&bad, &[0u8; 10], &HeaderShape::minimal(), ByteOrder::Little)),
            Step::Bytes(depth_frame(2, 1, 1)),
        ]),
        Attempt::Accept(vec![Step::Bytes(depth_frame(3, 1, 1)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config(), &transport);

    // Frame 2 was on the misaligned connection and is never seen.
    assert_eq!(take_timestamps(&mut frames, 1).await, vec![3]);

    let stats = handle.stats();
    assert_eq!(stats.reconnects, 1);
    assert!(stats.last_error.as_deref().is_some_and(|e| e.contains("Unsupported pixel format")));
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn oversized_payload_is_treated_as_misalignment() {
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![Step::Bytes(depth_frame(1, 4, 2)), Step::Stall]),
        Attempt::Accept(vec![Step::Bytes(depth_frame(2, 2, 1)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config().with_max_payload_bytes(8), &transport);

    assert_eq!(take_timestamps(&mut frames, 1).await, vec![2]);
    let stats = handle.stats();
    assert_eq!(stats.reconnects, 1);
    assert!(stats.last_error.as_deref().is_some_and(|e| e.contains("16 byte payload")));
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn oversized_repeat_timestamp_drains_instead_of_discarding() {
    let oversized_header = frame_bytes(
        &depth_header(1, 4, 2),
        &[],
        &HeaderShape::minimal(),
        ByteOrder::Little,
    );
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![
            Step::Bytes(depth_frame(1, 1, 1)),
            Step::Bytes(oversized_header),
            Step::Stall,
        ]),
        Attempt::Accept(vec![Step::Bytes(depth_frame(2, 1, 1)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config().with_max_payload_bytes(8), &transport);

    assert_eq!(take_timestamps(&mut frames, 2).await, vec![1, 2]);
    let stats = handle.stats();
    assert_eq!(stats.reconnects, 1);
    assert_eq!(stats.duplicates_discarded, 0);
    assert!(stats.last_error.as_deref().is_some_and(|e| e.contains("16 byte payload")));
    assert_eq!(transport.connect_count(), 2);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn repeat_timestamp_cut_short_drains_instead_of_discarding() {
    let mut truncated = depth_frame(1, 4, 2);
    truncated.truncate(truncated.len() - 10);
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![
            Step::Bytes(depth_frame(1, 4, 2)),
            Step::Bytes(truncated),
            Step::Close,
        ]),
        Attempt::Accept(vec![Step::Bytes(depth_frame(2, 4, 2)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config(), &transport);

    assert_eq!(take_timestamps(&mut frames, 2).await, vec![1, 2]);
    let stats = handle.stats();
    assert_eq!(stats.reconnects, 1);
    assert_eq!(stats.duplicates_discarded, 0);
    assert!(stats.last_error.as_deref().is_some_and(|e| e.contains("after 6 of 16 bytes")));
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn read_timeout_drains_and_reconnects() {
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![Step::Stall]),
        Attempt::Accept(vec![Step::Bytes(depth_frame(7, 2, 2)), Step::Stall]),
    ]);
    let config = config().with_read_timeout(Duration::from_millis(1500));
    let (handle, mut frames) = subscribe(config, &transport);

    assert_eq!(take_timestamps(&mut frames, 1).await, vec![7]);
    let times = transport.connect_times();
    assert_eq!(times[1] - times[0], Duration::from_millis(1500));
    assert!(handle.stats().last_error.as_deref().is_some_and(|e| e.contains("No data received")));
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn connect_timeout_counts_as_failure() {
    let transport = ScriptedTransport::new([
        Attempt::Hang,
        Attempt::Accept(vec![Step::Bytes(depth_frame(1, 1, 1)), Step::Stall]),
    ]);
    let config = config()
        .with_connect_timeout(Duration::from_millis(500))
        .with_reconnect_backoff(Duration::from_secs(1));
    let (handle, mut frames) = subscribe(config, &transport);

    assert_eq!(take_timestamps(&mut frames, 1).await, vec![1]);
    let times = transport.connect_times();
    assert_eq!(times[1] - times[0], Duration::from_millis(1500));
    assert_eq!(handle.stats().connect_failures, 1);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn transport_error_drains() {
    let transport = ScriptedTransport::new([
        Attempt::Accept(vec![Step::Fail(std::io::ErrorKind::ConnectionReset)]),
        Attempt::Accept(vec![Step::Bytes(depth_frame(9, 1, 1)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config(), &transport);

    assert_eq!(take_timestamps(&mut frames, 1).await, vec![9]);
    assert_eq!(handle.stats().reconnects, 1);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn cancel_during_partial_frame_yields_nothing() {
    let frame = depth_frame(1, 4, 2);
    let transport = ScriptedTransport::new([Attempt::Accept(vec![
        Step::Bytes(frame[..30].to_vec()),
        Step::Stall,
    ])]);
    let (handle, mut frames) = subscribe(config(), &transport);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.state(), ConnectionState::Streaming);

    handle.cancel();
    let stats = handle.join().await.expect("receiver finished");
    assert_eq!(stats.frames_yielded, 0);
    assert_eq!(stats.state, ConnectionState::Disconnected);
    assert!(frames.next().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn cancel_during_backoff_stops_retrying() {
    let transport = ScriptedTransport::default();
    let (handle, _frames) = subscribe(config(), &transport);

    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(transport.connect_count(), 2);

    handle.cancel();
    let stats = handle.join().await.expect("receiver finished");
    assert_eq!(stats.connect_failures, 2);
    assert_eq!(stats.consecutive_connect_failures, 2);
    assert_eq!(transport.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_frame_stream_stops_receiver() {
    let transport = ScriptedTransport::new([Attempt::Accept(vec![
        Step::Bytes(depth_frame(1, 1, 1)),
        Step::Stall,
    ])]);
    let (handle, frames) = subscribe(config(), &transport);
    drop(frames);

    let stats = handle.join().await.expect("receiver finished");
    assert_eq!(stats.frames_yielded, 0);
    assert_eq!(stats.state, ConnectionState::Disconnected);
    assert_eq!(transport.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_cancels_receiver() {
    let transport = ScriptedTransport::new([Attempt::Accept(vec![Step::Stall])]);
    let (handle, mut frames) = subscribe(config(), &transport);
    tokio::time::sleep(Duration::from_millis(10)).await;

    drop(handle);
    assert!(frames.next().await.is_none());
    assert_eq!(transport.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stats_updates_follow_state_changes() {
    let transport = ScriptedTransport::new([
        Attempt::Refuse,
        Attempt::Accept(vec![Step::Bytes(depth_frame(1, 1, 1)), Step::Stall]),
    ]);
    let (handle, mut frames) = subscribe(config(), &transport);
    let mut updates = handle.stats_updates();

    let streaming = loop {
        let stats = updates.next().await.expect("stats update");
        if stats.is_streaming() {
            break stats;
        }
    };
    assert_eq!(streaming.connect_failures, 1);
    assert_eq!(streaming.consecutive_connect_failures, 0);
    assert!(streaming.last_error.as_deref().is_some_and(|e| e.contains("10081")));

    assert!(frames.next().await.is_some());
    handle.cancel();
}

#[tokio::test]
async fn invalid_config_is_rejected_before_spawning() {
    let transport = ScriptedTransport::default();
    let result = HoloStream::subscribe_with_transport(
        StreamConfig::new("", 10080, HeaderShape::minimal()),
        transport.clone(),
    );
    assert!(matches!(result, Err(StreamError::Config { .. })));
    assert_eq!(transport.connect_count(), 0);
}

#[test]
fn starting_outside_a_runtime_is_an_error() {
    let result = HoloStream::subscribe_with_transport(config(), ScriptedTransport::default());
    assert!(matches!(result, Err(StreamError::Task { .. })));
}

#[tokio::test(start_paused = true)]
async fn holoros_layout_streams_bgra_frames_with_matrices() {
    use crate::types::{Matrix4x4, MatrixSlot, NamedMatrix};

    let shape = HeaderShape::holoros();
    let mut pose = Matrix4x4::identity();
    pose.rows[2][3] = 1.5;
    let header = FrameHeader {
        timestamp: 133_000_000,
        image_width: 2,
        image_height: 2,
        pixel_stride: 8,
        pixel_format: Some(crate::types::BITMAP_FORMAT_BGRA8),
        matrices: vec![
            NamedMatrix { slot: MatrixSlot::FrameToOrigin, matrix: pose },
            NamedMatrix { slot: MatrixSlot::CameraView, matrix: Matrix4x4::identity() },
            NamedMatrix { slot: MatrixSlot::CameraProjection, matrix: Matrix4x4::identity() },
        ],
        ..Default::default()
    };
    let payload: Vec<u8> = (0u8..16).collect();
    let bytes = frame_bytes(&header, &payload, &shape, ByteOrder::Little);
    let transport =
        ScriptedTransport::new([Attempt::Accept(vec![Step::Chunked(bytes, 50), Step::Stall])]);

    let config = StreamConfig::new("headset.test", 10080, shape);
    let (handle, mut frames) = subscribe(config, &transport);

    let frame = frames.next().await.expect("color frame");
    assert_eq!(frame.pixels.shape(), (2, 2, 4));
    assert_eq!(frame.pixels.as_color(), Some(payload.as_slice()));
    assert_eq!(
        frame.matrix(MatrixSlot::FrameToOrigin).map(|m| m.translation()),
        Some([0.0, 0.0, 1.5])
    );
    assert_eq!(frame.matrices().len(), 3);
    handle.cancel();
}
