use std::sync::{Arc, Barrier};
use std::thread;

use courier_intake::cache::{
    Cache, CacheDomain, CacheKey, CacheProfile, CacheSource, CacheType, CacheValue, CacheVersion,
    ScopedCache,
};
use uuid::Uuid;

fn tracking_key(raw: u32) -> CacheKey<u32> {
    CacheKey::new(raw)
        .with_type(CacheType::Memory)
        .with_domain(CacheDomain::Tracking)
        .with_source(CacheSource::TrackingGenerator)
        .with_version(CacheVersion::V1_0)
}

#[test]
fn writers_on_distinct_keys_do_not_interfere() {
    const WRITERS: u32 = 8;
    const PER_WRITER: usize = 500;

    let cache: Arc<Cache<u32, usize>> = Arc::new(Cache::new());
    let barrier = Arc::new(Barrier::new(WRITERS as usize));

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let key = tracking_key(writer);
                cache.register(key.clone());
                barrier.wait();
                for i in 0..PER_WRITER {
                    cache.add(&key, CacheValue::new(i)).expect("registered");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer");
    }

    for writer in 0..WRITERS {
        let key = tracking_key(writer);
        let expected: Vec<usize> = (0..PER_WRITER).rev().collect();
        assert_eq!(cache.recent(&key, 0), expected, "append order for {writer}");
    }
    assert_eq!(cache.value_count(), WRITERS as usize * PER_WRITER);
}

#[test]
fn concurrent_registration_creates_one_bucket() {
    const WORKERS: usize = 16;
    let cache: Arc<Cache<u32, usize>> = Arc::new(Cache::new());
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let created = cache.register(tracking_key(1));
                cache
                    .add(&tracking_key(1), CacheValue::new(worker))
                    .expect("registered");
                created
            })
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker"))
        .filter(|created| *created)
        .count();

    assert_eq!(created, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.bucket(&tracking_key(1)).len(), WORKERS);
}

#[test]
fn removing_every_value_concurrently_drops_the_key() {
    const VALUES: usize = 64;
    let cache: Arc<Cache<u32, usize>> = Arc::new(Cache::new());
    let key = tracking_key(9);
    cache.register(key.clone());
    for value in 0..VALUES {
        cache.add(&key, CacheValue::new(value)).expect("registered");
    }

    let handles: Vec<_> = (0..VALUES)
        .map(|value| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.remove_by_value(&CacheValue::new(value)))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("remover"));
    }

    assert!(!cache.contains_key(&key));
    assert!(cache.is_empty());
}

#[test]
fn scoped_views_share_one_store() {
    let cache: Arc<Cache<Uuid, String>> = Arc::new(Cache::new());
    let qr = ScopedCache::new(CacheProfile::QR_CODES, Arc::clone(&cache));
    let scans = ScopedCache::new(CacheProfile::SCANS, Arc::clone(&cache));
    let label = Uuid::new_v4();

    qr.record(label, "TAVALL-00000000000001".to_string())
        .expect("record");
    scans.record(label, "scanned".to_string()).expect("record");

    assert_eq!(cache.len(), 2);
    assert!(cache.contains_raw_key(&label));
    assert_eq!(cache.find_by_type(CacheType::Memory).len(), 2);
    assert_eq!(cache.find_by_domain(CacheDomain::Qr).len(), 1);

    let stats = cache.stats(None);
    assert_eq!(stats.total_entries(), 2);
    assert_eq!(stats.valid_entries(), 2);
    assert_eq!(stats.expired_entries(), 0);

    cache.clear();
    assert!(!qr.contains(label));
}
