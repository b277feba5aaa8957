use cabin_rates::config::Config;
use cabin_rates::models::{BedCounts, CabinDetail};
use cabin_rates::{DetailCache, ListingExtractor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

fn detail(name: &str) -> CabinDetail {
    CabinDetail {
        name: name.to_string(),
        url: format!("https://www.deepcreek.com/vacation-rentals/{}", name),
        occupancy: 14,
        beds: 6,
        bed_levels: BedCounts {
            upper: 2,
            main: 2,
            lower: 2,
            above_garage: 0,
        },
        baths: 4,
        amenities: ["Grill", "A/C", "Wifi", "Fire Pit"]
            .iter()
            .map(|a| a.to_string())
            .collect::<BTreeSet<_>>(),
        needs_follow_up: false,
    }
}

// Concurrent lookups against a warm detail cache, as weekend passes after the first see it
pub fn cache_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("detail_cache");

    for cabins_count in [50, 500, 5000].iter() {
        let cache = Arc::new(DetailCache::new());
        let names: Vec<String> = (0..*cabins_count).map(|i| format!("cabin-{}", i)).collect();
        for name in &names {
            cache.insert(detail(name));
        }
        let names = Arc::new(names);

        group.bench_with_input(
            BenchmarkId::from_parameter(cabins_count),
            cabins_count,
            |b, _| {
                b.iter(|| {
                    let handles: Vec<_> = (0..4)
                        .map(|_| {
                            let cache = Arc::clone(&cache);
                            let names = Arc::clone(&names);
                            thread::spawn(move || {
                                let mut rng = thread_rng();
                                for _ in 0..250 {
                                    if let Some(name) = names.choose(&mut rng) {
                                        black_box(cache.get(name));
                                    }
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn listing_page(amenities_count: usize) -> String {
    let items: String = (0..amenities_count)
        .map(|i| match i % 4 {
            0 => "<li class=\"amenity-list-item\">Grills (Gas)</li>".to_string(),
            1 => "<li class=\"amenity-list-item\">Internet: Wifi</li>".to_string(),
            2 => "<li class=\"amenity-list-item\">Swimming Pool (Community)</li>".to_string(),
            _ => format!("<li class=\"amenity-list-item\">Feature {}</li>", i),
        })
        .collect();
    format!(
        "<html><body><span class=\"rc-lodging-occ\">Sleeps 14</span>\
         <span class=\"rc-lodging-beds\">6 Bedrooms</span>\
         <span class=\"rc-lodging-baths\">4.5 Baths</span>\
         <ul><li>Bedroom 1 - Upper Level</li><li>Bedroom 2 - Main Level</li></ul>\
         <ul>{}</ul></body></html>",
        items
    )
}

pub fn extract_benchmark(c: &mut Criterion) {
    let extractor = ListingExtractor::new(Config::default().amenity_vocabulary()).unwrap();
    let mut group = c.benchmark_group("listing_extract");

    for amenities_count in [10, 100].iter() {
        let page = listing_page(*amenities_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(amenities_count),
            &page,
            |b, page| b.iter(|| black_box(extractor.extract(page))),
        );
    }

    group.finish();
}

criterion_group!(benches, cache_benchmark, extract_benchmark);
criterion_main!(benches);
