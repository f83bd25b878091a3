use std::str::FromStr;

use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next
};
use http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::{
    Context,
    KeyValue,
    global,
    trace::{Span, SpanKind, Tracer}
};
use opentelemetry_http::HeaderExtractor;

/// Trace context sent by the caller, if any.
fn parent_context(request: &ServiceRequest) -> Context {
    // ? actix still speaks http 0.2, the extractor wants http 1.x
    let headers = HeaderMap::from_iter(request.headers().iter().filter_map(
        |(name, value)| {
            Some((
                HeaderName::from_str(name.as_str()).ok()?,
                HeaderValue::from_bytes(value.as_bytes()).ok()?
            ))
        }
    ));

    global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(&headers))
    })
}

pub async fn otel_middleware(
    request: ServiceRequest,
    next: Next<impl MessageBody>
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    // unmatched routes (404s, static files) aren't worth a span each
    let Some(route) = request.match_pattern() else {
        return next.call(request).await;
    };

    let tracer = global::tracer("");

    let mut span = tracer
        .span_builder(format!("{} {}", request.method(), route))
        .with_kind(SpanKind::Server)
        .with_attributes(vec![
            KeyValue::new("http.method", request.method().to_string()),
            KeyValue::new("http.route", route),
            KeyValue::new("http.path", request.uri().path().to_string()),
            KeyValue::new(
                "http.query",
                request.uri().query().unwrap_or_default().to_string()
            ),
        ])
        .start_with_context(&tracer, &parent_context(&request));

    let response = next.call(request).await;

    span.set_attribute(KeyValue::new(
        "http.status_code",
        match response {
            Ok(ref res) => res.status().as_u16().to_string(),
            Err(_) => "500".to_string()
        }
    ));

    span.end();

    response
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, middleware::from_fn, test, web};

    use super::*;

    #[actix_web::test]
    async fn passes_requests_through() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(otel_middleware))
                .route("/items/{id}", web::get().to(HttpResponse::NoContent))
        )
        .await;

        let matched = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/items/42")
                .insert_header(("traceparent", "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"))
                .to_request()
        )
        .await;

        assert_eq!(matched.status(), 204);

        let unmatched = test::call_service(
            &app,
            test::TestRequest::get().uri("/nowhere").to_request()
        )
        .await;

        assert_eq!(unmatched.status(), 404);
    }
}
