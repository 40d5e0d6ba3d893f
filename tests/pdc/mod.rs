use watchgfx::{
  pdc::{
    check_file_header, DrawCommandImage, DrawCommandSequence, DrawCommandType, GContext,
    DURATION_INFINITE, PLAY_COUNT_INFINITE,
  },
  DecodeError, GColor8, GPoint, GPointPrecise, GSize, ResourceMap, Tag,
};

use crate::TestStore;

fn command(ty: u8, stroke: u8, width: u8, fill: u8, open_or_radius: u16, points: &[(i16, i16)]) -> Vec<u8> {
  let mut v = vec![ty, 0, stroke, width, fill];
  v.extend_from_slice(&open_or_radius.to_le_bytes());
  v.extend_from_slice(&(points.len() as u16).to_le_bytes());
  for (x, y) in points {
    v.extend_from_slice(&x.to_le_bytes());
    v.extend_from_slice(&y.to_le_bytes());
  }
  v
}

fn list(commands: &[Vec<u8>]) -> Vec<u8> {
  let mut v = (commands.len() as u16).to_le_bytes().to_vec();
  commands.iter().for_each(|c| v.extend_from_slice(c));
  v
}

/// A filled square and a dot.
fn square_and_dot() -> Vec<u8> {
  list(&[
    command(1, 0xC0, 1, 0xF0, 0, &[(0, 0), (4, 0), (4, 4), (0, 4)]),
    command(2, 0xC0, 0, 0xC3, 2, &[(2, 2)]),
  ])
}

fn image_payload(commands: Vec<u8>) -> Vec<u8> {
  let mut v = vec![1, 0];
  v.extend_from_slice(&10_i16.to_le_bytes());
  v.extend_from_slice(&8_i16.to_le_bytes());
  v.extend(commands);
  v
}

fn sequence_payload(play_count: u16, durations: &[u16]) -> Vec<u8> {
  let mut v = vec![1, 0];
  v.extend_from_slice(&10_i16.to_le_bytes());
  v.extend_from_slice(&8_i16.to_le_bytes());
  v.extend_from_slice(&play_count.to_le_bytes());
  v.extend_from_slice(&(durations.len() as u16).to_le_bytes());
  for (i, d) in durations.iter().enumerate() {
    v.extend_from_slice(&d.to_le_bytes());
    v.extend(list(&[command(2, 0xC0, 1, 0, 1, &[(i as i16, 0)])]));
  }
  v
}

fn file(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
  let mut v = tag.to_vec();
  v.extend_from_slice(&(payload.len() as u32).to_le_bytes());
  v.extend_from_slice(payload);
  v
}

/// Counts shapes and keeps the points it was handed.
#[derive(Default)]
struct Canvas {
  fills: usize,
  strokes: usize,
  points: Vec<GPoint>,
}
impl GContext for Canvas {
  fn set_fill_color(&mut self, _: GColor8) {}
  fn set_stroke_color(&mut self, _: GColor8) {}
  fn set_stroke_width(&mut self, _: u8) {}
  fn fill_circle(&mut self, center: GPoint, _: u16) {
    self.fills += 1;
    self.points.push(center);
  }
  fn draw_circle(&mut self, center: GPoint, _: u16) {
    self.strokes += 1;
    self.points.push(center);
  }
  fn fill_path(&mut self, points: &[GPoint]) {
    self.fills += 1;
    self.points.extend_from_slice(points);
  }
  fn draw_path(&mut self, points: &[GPoint], _: bool) {
    self.strokes += 1;
    self.points.extend_from_slice(points);
  }
  fn fill_path_precise(&mut self, _: &[GPointPrecise]) {
    self.fills += 1;
  }
  fn draw_path_precise(&mut self, _: &[GPointPrecise], _: bool) {
    self.strokes += 1;
  }
}

#[test]
fn test_image_resource_mapped_and_heap() {
  let bytes = file(b"PDCI", &image_payload(square_and_dot()));
  let map = ResourceMap::new(TestStore::default().with(1, bytes.clone(), true).with(2, bytes, false));

  let mut mapped = DrawCommandImage::create_with_resource(&map, 0, 1).unwrap();
  assert!(mapped.is_mapped());
  assert_eq!(map.mapped_refcount(0, 1), 1);
  assert_eq!(mapped.bounds_size(), GSize::new(10, 8));
  assert!(mapped.command_list_mut().is_none());
  assert_eq!(mapped.set_bounds_size(GSize::new(1, 1)), Err(DecodeError::BadParameter));

  let list = mapped.command_list();
  assert_eq!(list.num_commands(), 2);
  let dot = list.get(1).unwrap();
  assert_eq!(dot.command_type(), DrawCommandType::Circle);
  assert_eq!(dot.radius(), 2);
  assert_eq!(dot.point(0), Some(GPoint::new(2, 2)));

  let mut canvas = Canvas::default();
  mapped.draw(&mut canvas, GPoint::new(100, 0)).unwrap();
  // the square is filled and stroked, the dot has no stroke width
  assert_eq!((canvas.fills, canvas.strokes), (2, 1));
  assert_eq!(canvas.points[0], GPoint::new(100, 0));

  let mut copy = mapped.to_owned().unwrap();
  assert!(!copy.is_mapped());
  copy.command_list_mut().unwrap().command_mut(0).unwrap().set_hidden(true);
  assert!(copy.command_list().get(0).unwrap().hidden());
  assert!(!mapped.command_list().get(0).unwrap().hidden());
  drop(mapped);
  assert_eq!(map.mapped_refcount(0, 1), 0);

  let mut heap = DrawCommandImage::create_with_resource(&map, 0, 2).unwrap();
  assert!(!heap.is_mapped());
  assert_eq!(map.mapped_refcount(0, 2), 0);
  heap.set_bounds_size(GSize::new(3, 4)).unwrap();
  assert_eq!(heap.bounds_size(), GSize::new(3, 4));
}

#[test]
fn test_image_resource_rejects() {
  let payload = image_payload(square_and_dot());
  let mut long_size = file(b"PDCI", &payload);
  long_size[4] += 1;
  let mut trailing = file(b"PDCI", &payload);
  trailing[4] += 1;
  trailing.push(0);
  let one_point_path = image_payload(list(&[command(1, 0xC0, 1, 0, 0, &[(0, 0)])]));
  let two_point_circle = image_payload(list(&[command(2, 0xC0, 1, 0, 3, &[(0, 0), (1, 1)])]));
  let store = TestStore::default()
    .with(1, file(b"PDCS", &payload), true)
    .with(2, long_size, true)
    .with(3, trailing, true)
    .with(4, file(b"PDCI", &one_point_path), true)
    .with(5, file(b"PDCI", &two_point_circle), true)
    .with(6, file(b"PDCI", &payload[..payload.len() - 2]), true);
  let map = ResourceMap::new(store);

  let expected = [
    (1, DecodeError::NotThisFormat),
    (2, DecodeError::Malformed),
    (3, DecodeError::Malformed),
    (4, DecodeError::Malformed),
    (5, DecodeError::Malformed),
    (6, DecodeError::Malformed),
  ];
  for (id, e) in expected {
    assert_eq!(DrawCommandImage::create_with_resource(&map, 0, id).unwrap_err(), e, "resource {id}");
    assert_eq!(map.mapped_refcount(0, id), 0);
  }
  assert_eq!(DrawCommandImage::create_with_resource(&map, 0, 7).unwrap_err(), DecodeError::NotFound);
}

#[test]
fn test_sequence_resource() {
  let bytes = file(b"PDCS", &sequence_payload(2, &[100, 200, 300]));
  let map = ResourceMap::new(TestStore::default().with(1, bytes, true));
  let mut seq = DrawCommandSequence::create_with_resource(&map, 0, 1).unwrap();
  assert!(seq.is_mapped());
  assert_eq!(seq.num_frames(), 3);
  assert_eq!(seq.play_count(), 2);
  assert_eq!(seq.play_duration(), 600);
  assert_eq!(seq.total_duration(), 1200);
  assert_eq!(seq.set_play_count(1), Err(DecodeError::BadParameter));
  assert!(seq.frame_by_index_mut(0).is_none());

  let durations: Vec<u16> = seq.frames().map(|f| f.duration()).collect();
  assert_eq!(durations, [100, 200, 300]);
  assert_eq!(seq.frame_duration(2), Some(300));
  assert_eq!(seq.frame_duration(3), None);

  let at = |ms| seq.frame_by_elapsed(ms).unwrap().duration();
  assert_eq!(at(0), 100);
  assert_eq!(at(99), 100);
  assert_eq!(at(100), 200);
  assert_eq!(at(650), 100);
  assert_eq!(at(1199), 300);
  // done playing, stays on the last frame
  assert_eq!(at(1200), 300);
  assert_eq!(at(u32::MAX), 300);

  let mut canvas = Canvas::default();
  seq.draw_at(&mut canvas, GPoint::new(0, 10), 350).unwrap();
  assert_eq!(canvas.points, [GPoint::new(2, 10)]);

  let mut visited = Vec::new();
  assert!(!seq.for_each_frame(|i, _| {
    visited.push(i);
    i < 2
  }));
  assert_eq!(visited, [1, 2]);

  let mut copy = seq.to_owned().unwrap();
  copy.set_play_count(PLAY_COUNT_INFINITE).unwrap();
  assert_eq!(copy.total_duration(), DURATION_INFINITE);
  assert_eq!(copy.frame_by_elapsed(1250).unwrap().duration(), 100);
  let mut frame = copy.frame_by_index_mut(1).unwrap();
  frame.set_duration(0);
  frame.command_list_mut().command_mut(0).unwrap().set_radius(9).unwrap();
  assert_eq!(copy.play_duration(), 400);
  assert_eq!(copy.frame_by_index(1).unwrap().command_list().get(0).unwrap().radius(), 9);
  // the mapped original is untouched
  assert_eq!(seq.frame_duration(1), Some(200));
  drop(seq);
  assert_eq!(map.mapped_refcount(0, 1), 0);
}

#[test]
fn test_sequence_total_duration_saturates() {
  let seq = DrawCommandSequence::from_vec(sequence_payload(0xFFFE, &[u16::MAX, u16::MAX])).unwrap();
  assert_eq!(seq.play_duration(), 2 * u16::MAX as u32);
  assert_eq!(seq.total_duration(), u32::MAX);

  let never = DrawCommandSequence::from_vec(sequence_payload(0, &[100])).unwrap();
  assert_eq!(never.total_duration(), 0);
  assert_eq!(never.frame_by_elapsed(0).unwrap().duration(), 100);
}

#[test]
fn test_sequence_rejects() {
  assert_eq!(DrawCommandSequence::from_vec(sequence_payload(1, &[])).unwrap_err(), DecodeError::Malformed);
  let mut trailing = sequence_payload(1, &[10, 20]);
  trailing.push(0);
  assert_eq!(DrawCommandSequence::validate(&trailing), Err(DecodeError::Malformed));
  let good = sequence_payload(1, &[10, 20]);
  assert_eq!(DrawCommandSequence::validate(&good[..good.len() - 1]), Err(DecodeError::Malformed));
  let mut newer = good.clone();
  newer[0] = 9;
  assert_eq!(DrawCommandSequence::validate(&newer), Err(DecodeError::Malformed));
  // an image is not a sequence
  let map = ResourceMap::new(TestStore::default().with(1, file(b"PDCI", &good), false));
  assert_eq!(
    DrawCommandSequence::create_with_resource(&map, 0, 1).unwrap_err(),
    DecodeError::NotThisFormat
  );
}

#[test]
fn test_check_file_header() {
  let payload = [1, 2, 3, 4];
  let bytes = file(b"PDCS", &payload);
  assert_eq!(check_file_header(&bytes, Tag::PDCS), Ok(&payload[..]));
  assert_eq!(check_file_header(&bytes[..6], Tag::PDCS), Err(DecodeError::Malformed));
}

#[test]
fn test_random_bytes_never_panic() {
  for _ in 0..500 {
    let v = crate::rand_bytes(96);
    if let Ok(image) = DrawCommandImage::from_vec(v.clone()) {
      let _ = image.draw(&mut Canvas::default(), GPoint::default());
    }
    if let Ok(seq) = DrawCommandSequence::from_vec(v) {
      let _ = seq.total_duration();
      let _ = seq.draw_at(&mut Canvas::default(), GPoint::default(), 1000);
    }
  }
  // damage a good sequence
  let good = sequence_payload(3, &[10, 20, 30]);
  for _ in 0..500 {
    let r = crate::rand_bytes(2);
    let mut bad = good.clone();
    let at = r[0] as usize % bad.len();
    bad[at] ^= r[1] | 1;
    if let Ok(mut seq) = DrawCommandSequence::from_vec(bad) {
      for i in 0..seq.num_frames() {
        let _ = seq.frame_by_index_mut(i).map(|mut f| f.set_duration(1));
      }
      let _ = seq.frame_by_elapsed(45);
    }
  }
}
