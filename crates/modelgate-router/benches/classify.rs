// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hot-path benchmarks: classification and both selection strategies.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use modelgate_config::ModelgateConfig;
use modelgate_core::{QueryHistory, StrategyKind, UserContext};
use modelgate_router::{ModelRouter, PromptClassifier, RouteRequest};

const SHORT: &str = "viết một bài thơ về mùa thu";
const LONG: &str = "Please refactor the authentication module so that session tokens \
    are rotated on every privilege change, then explain how the new flow \
    interacts with the existing middleware and what migration steps are needed.";

fn bench_classify(c: &mut Criterion) {
    let classifier = PromptClassifier::default();

    c.bench_function("classify_short", |b| {
        b.iter(|| black_box(classifier.classify(black_box(SHORT), false)))
    });
    c.bench_function("classify_long", |b| {
        b.iter(|| black_box(classifier.classify(black_box(LONG), false)))
    });
}

fn bench_route(c: &mut Criterion) {
    let router = ModelRouter::new(&ModelgateConfig::default());
    let user = UserContext::new("bench", "vn_pro", 5.0, Vec::new(), QueryHistory::with_capacity(8));

    c.bench_function("route_weighted", |b| {
        b.iter(|| {
            let mut request = RouteRequest::new(black_box(LONG), &user);
            request.strategy = Some(StrategyKind::Weighted);
            black_box(router.route(&request))
        })
    });
    c.bench_function("route_affinity", |b| {
        b.iter(|| {
            let mut request = RouteRequest::new(black_box(LONG), &user);
            request.strategy = Some(StrategyKind::Affinity);
            black_box(router.route(&request))
        })
    });
}

criterion_group!(benches, bench_classify, bench_route);
criterion_main!(benches);
