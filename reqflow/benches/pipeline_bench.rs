//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::{Method, StatusCode};
use reqflow::context::Context;
use reqflow::core::{WireRequest, WireResponse};
use reqflow::errors::BoxError;
use reqflow::pathx::Template;
use reqflow::pipeline::PipelineBuilder;
use reqflow::request::{
    ContentLengthBuilder, ContentMd5Builder, RequestIdBuilder, ServiceOperationInitializer,
    WrapOperationErrorInitializer,
};
use reqflow::response::{
    RequestIdDeserializer, WrapRequestErrorDeserializer, WrapResponseErrorDeserializer,
};
use reqflow::retry::RetryBuilder;
use reqflow::testing::{FixedRequestSerializer, StatusDeserializer};
use reqflow::transport::FnTransport;
use std::collections::HashMap;

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let pipeline = PipelineBuilder::<(), u16>::new()
        .initializer(WrapOperationErrorInitializer)
        .initializer(ServiceOperationInitializer::new("Store", "GetProduct"))
        .serializer(
            FixedRequestSerializer::new(Method::POST, "http://example.com/products")
                .with_body(vec![b'x'; 4096]),
        )
        .builder(RequestIdBuilder::new())
        .builder(ContentMd5Builder)
        .builder(ContentLengthBuilder)
        .builder(RetryBuilder::default())
        .deserializer(WrapRequestErrorDeserializer)
        .deserializer(WrapResponseErrorDeserializer)
        .deserializer(RequestIdDeserializer::new())
        .deserializer(StatusDeserializer)
        .transport(FnTransport::new(|_ctx: Context, _request: WireRequest| async {
            Ok::<_, BoxError>(WireResponse::new(StatusCode::OK))
        }))
        .build()
        .expect("pipeline");

    c.bench_function("pipeline_call", |b| {
        b.iter(|| {
            let outcome = runtime.block_on(pipeline.handle(Context::background(), ()));
            black_box(outcome.output)
        })
    });
}

fn template_benchmark(c: &mut Criterion) {
    let template = Template::parse("/stores/:store/products/:product").expect("template");
    let data = HashMap::from([("store", "north east"), ("product", "中/42")]);

    c.bench_function("template_execute", |b| {
        b.iter(|| black_box(template.execute(black_box(&data))))
    });
}

criterion_group!(benches, pipeline_benchmark, template_benchmark);
criterion_main!(benches);
