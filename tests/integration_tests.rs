use bytes::Bytes;
use rustc_hash::FxHashSet;

use photomap::{
    BoundingBox, ClickAction, ClusterConfig, ExtractError, FileHandle, Gallery, GeoTag,
    GeotagExtractor, IngestPipeline, IngestProgress, NodeId, PhotoId, PhotoMap,
};

/// Extractor driven by the file contents: `"lat,lng"` yields a geotag,
/// `"nogps"` yields none, anything else fails.
struct ScriptedExtractor;

impl GeotagExtractor for ScriptedExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Option<GeoTag>, ExtractError> {
        let text =
            std::str::from_utf8(bytes).map_err(|_| ExtractError::MalformedGps("not utf-8"))?;
        if text == "nogps" {
            return Ok(None);
        }
        let (lat, lng) = text
            .split_once(',')
            .ok_or(ExtractError::MalformedGps("unreadable file"))?;
        Ok(Some(GeoTag::new(
            lat.parse().map_err(|_| ExtractError::MalformedGps("lat"))?,
            lng.parse().map_err(|_| ExtractError::MalformedGps("lng"))?,
        )))
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn image(name: &str, payload: &str) -> FileHandle {
    FileHandle::new(
        name,
        "image/jpeg",
        Bytes::copy_from_slice(payload.as_bytes()),
    )
}

fn geotagged(name: &str, lat: f64, lng: f64) -> FileHandle {
    image(name, &format!("{lat},{lng}"))
}

#[tokio::test]
async fn test_upload_to_map_flow() {
    init_logging();

    // 25 image files: 18 geotagged, 5 without GPS, 2 corrupt
    let mut files = Vec::new();
    for i in 0..18 {
        files.push(geotagged(
            &format!("trip{i}.jpg"),
            48.85 + i as f64 * 0.001,
            2.35 + i as f64 * 0.001,
        ));
    }
    for i in 0..5 {
        files.push(image(&format!("scan{i}.jpg"), "nogps"));
    }
    for i in 0..2 {
        files.push(image(&format!("broken{i}.jpg"), "!corrupt!"));
    }

    let pipeline = IngestPipeline::new(ScriptedExtractor);
    let session = pipeline.start(files);
    let progress = session.subscribe();
    let photos = session.finish().await.unwrap();

    assert_eq!(
        *progress.borrow(),
        IngestProgress {
            processed: 25,
            total: 25
        }
    );
    assert_eq!(photos.len(), 18);

    let mut map = PhotoMap::new(ClusterConfig::default()).unwrap();
    assert_eq!(map.extend(photos).unwrap(), 18);

    // everything is represented exactly once at any zoom
    for zoom in [0, 8, 16] {
        let nodes = map.query(&BoundingBox::world(), zoom);
        assert_eq!(nodes.iter().map(|n| n.count()).sum::<u32>(), 18, "zoom {zoom}");
    }
}

#[tokio::test]
async fn test_near_identical_photos_cluster_by_zoom() {
    init_logging();

    let files = vec![
        geotagged("a.jpg", 40.71280, -74.00600),
        geotagged("b.jpg", 40.71281, -74.00601),
        geotagged("c.jpg", 40.71279, -74.00599),
    ];
    let pipeline = IngestPipeline::new(ScriptedExtractor);
    let photos = pipeline.start(files).finish().await.unwrap();

    let mut map = PhotoMap::new(ClusterConfig::default().with_zoom_range(0, 16)).unwrap();
    map.extend(photos).unwrap();

    let at_5 = map.query(&BoundingBox::world(), 5);
    assert_eq!(at_5.len(), 1);
    assert!(at_5[0].is_cluster());
    assert_eq!(at_5[0].count(), 3);

    let at_16 = map.query(&BoundingBox::world(), 16);
    assert_eq!(at_16.len(), 3);
    assert!(at_16.iter().all(|n| !n.is_cluster()));
}

#[tokio::test]
async fn test_cluster_click_drives_gallery() {
    let files = vec![
        geotagged("a.jpg", 35.6595, 139.7005),
        geotagged("b.jpg", 35.6596, 139.7006),
        geotagged("c.jpg", 35.6597, 139.7007),
    ];
    let pipeline = IngestPipeline::new(ScriptedExtractor);
    let photos = pipeline.start(files).finish().await.unwrap();

    let mut map = PhotoMap::new(ClusterConfig::default()).unwrap();
    map.extend(photos).unwrap();

    let nodes = map.query(&BoundingBox::world(), 4);
    assert_eq!(nodes.len(), 1);

    let ClickAction::OpenGallery {
        photos,
        start_index,
    } = map.click(nodes[0].id).unwrap()
    else {
        panic!("cluster click must open the gallery");
    };
    assert_eq!(photos.len(), 3);
    assert_eq!(start_index, 0);

    let mut gallery = Gallery::new();
    gallery.open_with(photos.clone(), start_index);
    assert_eq!(gallery.current(), Some(&photos[0]));

    // wrap both ways through the sequence
    gallery.prev();
    assert_eq!(gallery.current(), Some(&photos[2]));
    gallery.next();
    gallery.next();
    gallery.next();
    gallery.next();
    assert_eq!(gallery.current(), Some(&photos[0]));
}

#[tokio::test]
async fn test_point_click_opens_single_photo() {
    let pipeline = IngestPipeline::new(ScriptedExtractor);
    let photos = pipeline
        .start(vec![geotagged("solo.jpg", 51.5074, -0.1278)])
        .finish()
        .await
        .unwrap();

    let mut map = PhotoMap::new(ClusterConfig::default()).unwrap();
    map.extend(photos).unwrap();

    let nodes = map.query(&BoundingBox::world(), 12);
    assert_eq!(nodes.len(), 1);
    let ClickAction::OpenGallery {
        photos,
        start_index,
    } = map.click(nodes[0].id).unwrap()
    else {
        panic!("point click must open the gallery");
    };
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].name, "solo.jpg");
    assert_eq!(start_index, 0);
}

#[tokio::test]
async fn test_reingesting_same_files_appends_disjoint_ids() {
    let make_files = || {
        (0..6)
            .map(|i| geotagged(&format!("p{i}.jpg"), 45.0 + i as f64 * 0.01, 7.0))
            .collect::<Vec<_>>()
    };

    let pipeline = IngestPipeline::new(ScriptedExtractor);
    let first = pipeline.start(make_files()).finish().await.unwrap();
    let second = pipeline.start(make_files()).finish().await.unwrap();

    let ids: FxHashSet<PhotoId> = first.iter().chain(second.iter()).map(|p| p.id).collect();
    assert_eq!(ids.len(), 12);

    let mut map = PhotoMap::new(ClusterConfig::default()).unwrap();
    map.extend(first).unwrap();
    map.extend(second).unwrap();
    assert_eq!(map.len(), 12);
}

#[tokio::test]
async fn test_snapshot_queries_are_stable_across_ingestion() {
    let pipeline = IngestPipeline::new(ScriptedExtractor);
    let photos = pipeline
        .start((0..10).map(|i| geotagged(&format!("p{i}.jpg"), 50.0, 8.0 + i as f64 * 0.001)).collect())
        .finish()
        .await
        .unwrap();

    let mut map = PhotoMap::new(ClusterConfig::default()).unwrap();
    map.extend(photos).unwrap();

    let snapshot = map.index();
    let before = snapshot.query(&BoundingBox::world(), 9);

    // a second session lands while the first snapshot is still in use
    let more = pipeline
        .start(vec![geotagged("late.jpg", 50.0, 8.5)])
        .finish()
        .await
        .unwrap();
    map.extend(more).unwrap();

    assert_eq!(snapshot.query(&BoundingBox::world(), 9), before);
    assert_eq!(
        map.query(&BoundingBox::world(), 9)
            .iter()
            .map(|n| n.count())
            .sum::<u32>(),
        11
    );
}

#[tokio::test]
async fn test_expansion_equals_count_for_every_cluster() {
    let files: Vec<FileHandle> = (0..30)
        .map(|i| {
            geotagged(
                &format!("p{i}.jpg"),
                59.32 + (i % 5) as f64 * 0.004,
                18.06 + (i / 5) as f64 * 0.004,
            )
        })
        .collect();

    let pipeline = IngestPipeline::new(ScriptedExtractor);
    let photos = pipeline.start(files).finish().await.unwrap();
    let mut map = PhotoMap::new(ClusterConfig::default()).unwrap();
    map.extend(photos).unwrap();
    let index = map.index();

    for zoom in 0..=16 {
        for node in index.query(&BoundingBox::world(), zoom) {
            if let NodeId::Cluster(id) = node.id {
                assert_eq!(
                    index.expand(id).unwrap().len() as u32,
                    node.count(),
                    "zoom {zoom}"
                );
            }
        }
    }
}
