use actix::prelude::*;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use storefront::coupon::SqliteCouponRepository;
use storefront::invoice::SqliteInvoiceRepository;
use storefront::merchant::SqliteMerchantRepository;
use storefront_types::coupon::rules::ACTIVE_LIMIT_REACHED;
use storefront_types::coupon::service::{self as coupon_service, CouponService};
use storefront_types::coupon::{Coupon, CouponDraft};
use storefront_types::invoice::service::InvoiceService;
use storefront_types::invoice::{InvoiceRepository, InvoiceStatus, NewInvoice};
use storefront_types::merchant::service::{self as merchant_service, MerchantService};
use tokio_rusqlite::Connection;

struct Setup {
    coupons: Addr<CouponService>,
    merchants: Addr<MerchantService>,
    invoice_service: Addr<InvoiceService>,
    invoices: Arc<dyn InvoiceRepository>,
}

async fn setup() -> Setup {
    let conn = Connection::open_in_memory().await.unwrap();
    storefront::prepare_connection(&conn, Duration::from_secs(5))
        .await
        .unwrap();
    let merchants = Arc::new(SqliteMerchantRepository::init(conn.clone()).await.unwrap());
    let coupons = Arc::new(SqliteCouponRepository::init(conn.clone()).await.unwrap());
    let invoices: Arc<dyn InvoiceRepository> =
        Arc::new(SqliteInvoiceRepository::init(conn).await.unwrap());
    Setup {
        coupons: CouponService::new(coupons, merchants.clone(), invoices.clone()).start(),
        invoice_service: InvoiceService::new(invoices.clone(), merchants.clone()).start(),
        merchants: MerchantService::new(merchants).start(),
        invoices,
    }
}

macro_rules! app {
    ($setup:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($setup.coupons.clone()))
                .app_data(Data::new($setup.merchants.clone()))
                .app_data(Data::new($setup.invoice_service.clone()))
                .configure(storefront::routes),
        )
        .await
    };
}

impl Setup {
    async fn merchant(&self, name: &str) -> i64 {
        self.merchants
            .send(merchant_service::Add(name.to_string()))
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn coupon(&self, merchant: i64, code: &str, active: bool) -> Coupon {
        let draft = CouponDraft {
            full_name: Some(format!("{code} sale")),
            code: Some(code.to_string()),
            dollar_off: Some(dec!(5)),
            active: Some(active),
            ..Default::default()
        };
        self.coupons
            .send(coupon_service::Create(merchant, draft))
            .await
            .unwrap()
            .unwrap()
            .coupon
    }
}

fn spring_sale() -> Value {
    json!({
        "fullName": "Spring Sale",
        "code": "SPRING10",
        "percentOff": 10,
        "active": false,
    })
}

#[actix_web::test]
async fn creates_a_coupon() {
    let setup = setup().await;
    let merchant = setup.merchant("Schroeder-Jerde").await;
    let app = app!(setup);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/merchants/{merchant}/coupons"))
        .set_json(spring_sale())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let data = &body["data"];
    assert_eq!(data["type"], "coupon");
    assert!(data["id"].is_string());
    assert_eq!(
        data["attributes"],
        json!({
            "fullName": "Spring Sale",
            "code": "SPRING10",
            "percentOff": 10.0,
            "dollarOff": null,
            "active": false,
            "merchantId": merchant,
            "usageCount": 0,
        })
    );
}

#[actix_web::test]
async fn rejects_a_taken_code_for_any_merchant() {
    let setup = setup().await;
    let first = setup.merchant("First").await;
    let second = setup.merchant("Second").await;
    let app = app!(setup);

    for (merchant, status) in [
        (first, StatusCode::CREATED),
        (first, StatusCode::UNPROCESSABLE_ENTITY),
        (second, StatusCode::UNPROCESSABLE_ENTITY),
    ] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/merchants/{merchant}/coupons"))
            .set_json(spring_sale())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), status);
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body: Value = test::read_body_json(res).await;
            let error = body["error"].as_str().unwrap().to_lowercase();
            assert!(error.contains("code has already been taken"), "{error}");
        }
    }
}

#[actix_web::test]
async fn requires_exactly_one_discount() {
    let setup = setup().await;
    let merchant = setup.merchant("Merchant").await;
    let app = app!(setup);

    let both = json!({
        "fullName": "Both", "code": "BOTH", "percentOff": 10, "dollarOff": 5, "active": false,
    });
    let neither = json!({ "fullName": "Neither", "code": "NEITHER", "active": false });
    for body in [both, neither] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/merchants/{merchant}/coupons"))
            .set_json(body)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(res).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("discount type (percent or dollar off)"));
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/merchants/{merchant}/coupons"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn rejects_a_sixth_active_coupon() {
    let setup = setup().await;
    let merchant = setup.merchant("Merchant").await;
    for i in 0..5 {
        setup.coupon(merchant, &format!("ACTIVE{i}"), true).await;
    }
    let app = app!(setup);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/merchants/{merchant}/coupons"))
        .set_json(json!({
            "fullName": "Sixth", "code": "SIXTH", "dollarOff": 2.5, "active": true,
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "error": ACTIVE_LIMIT_REACHED }));
}

#[actix_web::test]
async fn toggles_against_the_active_cap() {
    let setup = setup().await;
    let merchant = setup.merchant("Merchant").await;
    let mut active = vec![];
    for i in 0..4 {
        active.push(setup.coupon(merchant, &format!("ON{i}"), true).await);
    }
    let fifth = setup.coupon(merchant, "FIFTH", false).await;
    let sixth = setup.coupon(merchant, "SIXTH", false).await;
    let app = app!(setup);

    let toggle = |id: i64| {
        test::TestRequest::patch()
            .uri(&format!("/api/v1/merchants/{merchant}/coupons/{id}"))
            .to_request()
    };

    let res = test::call_service(&app, toggle(fifth.id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["attributes"]["active"], true);
    let count = setup
        .coupons
        .send(coupon_service::CountActive(merchant, None))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 5);

    let res = test::call_service(&app, toggle(sixth.id)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "errors": [ACTIVE_LIMIT_REACHED] }));

    // deactivating is never capped
    let res = test::call_service(&app, toggle(active[0].id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["attributes"]["active"], false);

    let res = test::call_service(&app, toggle(sixth.id)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn filters_by_active_flag() {
    let setup = setup().await;
    let merchant = setup.merchant("Merchant").await;
    let mut codes = vec![];
    for i in 0..13 {
        let code = format!("C{i:02}");
        setup.coupon(merchant, &code, i % 3 == 0 && i < 12).await;
        codes.push(code);
    }
    let app = app!(setup);

    let list = |query: &str| {
        test::TestRequest::get()
            .uri(&format!("/api/v1/merchants/{merchant}/coupons{query}"))
            .to_request()
    };

    let body: Value = test::call_and_read_body_json(&app, list("?active=true")).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 4);
    assert!(data.iter().all(|c| c["attributes"]["active"] == true));

    let body: Value = test::call_and_read_body_json(&app, list("?active=false")).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 9);
    assert!(data.iter().all(|c| c["attributes"]["active"] == false));

    let body: Value = test::call_and_read_body_json(&app, list("")).await;
    let listed = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["attributes"]["code"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(listed, codes);

    let res = test::call_service(&app, list("?active=yes")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn missing_records_are_not_found() {
    let setup = setup().await;
    let owner = setup.merchant("Owner").await;
    let other = setup.merchant("Other").await;
    let coupon = setup.coupon(owner, "OWNED", false).await;
    let app = app!(setup);

    let req = test::TestRequest::get()
        .uri("/api/v1/merchants/9999/coupons")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "error": "Merchant not found" }));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/merchants/9999/coupons/{}", coupon.id))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "error": "Merchant not found" }));

    let req = test::TestRequest::post()
        .uri("/api/v1/merchants/9999/coupons")
        .set_json(spring_sale())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    for req in [
        test::TestRequest::get().uri(&format!("/api/v1/merchants/{other}/coupons/{}", coupon.id)),
        test::TestRequest::patch().uri(&format!("/api/v1/merchants/{other}/coupons/{}", coupon.id)),
        test::TestRequest::get().uri(&format!("/api/v1/merchants/{owner}/coupons/9999")),
    ] {
        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "error": "Coupon not found" }));
    }
}

#[actix_web::test]
async fn rejects_malformed_json() {
    let setup = setup().await;
    let merchant = setup.merchant("Merchant").await;
    let app = app!(setup);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/merchants/{merchant}/coupons"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"fullName\": ")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn reports_usage_from_invoices() {
    let setup = setup().await;
    let merchant = setup.merchant("Merchant").await;
    let used = setup.coupon(merchant, "USED", true).await;
    let idle = setup.coupon(merchant, "IDLE", false).await;
    for coupon in [Some(used.id), Some(used.id), Some(idle.id), None] {
        setup
            .invoices
            .add(NewInvoice {
                merchant_id: merchant,
                customer_id: None,
                coupon_id: coupon,
                status: InvoiceStatus::Shipped,
            })
            .await
            .unwrap();
    }
    let app = app!(setup);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/merchants/{merchant}/coupons/{}", used.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["attributes"]["usageCount"], 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/merchants/{merchant}/coupons"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let usage = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["attributes"]["usageCount"].clone())
        .collect::<Vec<_>>();
    assert_eq!(usage, vec![json!(2), json!(1)]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/merchants/{merchant}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body["data"],
        json!({
            "id": merchant.to_string(),
            "type": "merchant",
            "attributes": {
                "name": "Merchant",
                "couponsCount": 2,
                "invoiceCouponCount": 2,
            },
        })
    );
}

#[actix_web::test]
async fn looks_up_merchants() {
    let setup = setup().await;
    let id = setup.merchant("Willms and Sons").await;
    let merchant = setup
        .merchants
        .send(merchant_service::Get(id))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(merchant.name, "Willms and Sons");
    let missing = setup
        .merchants
        .send(merchant_service::Get(id + 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(missing, None);

    let app = app!(setup);
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/merchants/{}", id + 1))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn extractor_errors_use_the_error_envelope() {
    let setup = setup().await;
    let merchant = setup.merchant("Merchant").await;
    let app = app!(setup);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/merchants/{merchant}/coupons?active=true&active=false"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert!(body["error"].as_str().unwrap().starts_with("query: "));

    let req = test::TestRequest::get()
        .uri("/api/v1/merchants/abc/coupons")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn lists_merchant_invoices_by_status() {
    let setup = setup().await;
    let packager = setup.merchant("Merchant Again").await;
    let shipper = setup.merchant("Another Merchant").await;
    let coupon = setup.coupon(packager, "UNIQUECODE", false).await;
    let rows = [
        (packager, InvoiceStatus::Packaged, None),
        (packager, InvoiceStatus::Shipped, None),
        (packager, InvoiceStatus::Shipped, None),
        (packager, InvoiceStatus::Shipped, None),
        (shipper, InvoiceStatus::Shipped, Some(coupon.id)),
        (shipper, InvoiceStatus::Shipped, None),
    ];
    let mut ids = vec![];
    for (merchant_id, status, coupon_id) in rows {
        let invoice = setup
            .invoices
            .add(NewInvoice {
                merchant_id,
                customer_id: Some(1),
                coupon_id,
                status,
            })
            .await
            .unwrap();
        ids.push(invoice.id);
    }
    let app = app!(setup);

    let list = |merchant: i64, query: &str| {
        test::TestRequest::get()
            .uri(&format!("/api/v1/merchants/{merchant}/invoices{query}"))
            .to_request()
    };

    let body: Value = test::call_and_read_body_json(&app, list(packager, "?status=packaged")).await;
    assert_eq!(
        body["data"],
        json!([{
            "id": ids[0].to_string(),
            "type": "invoice",
            "attributes": {
                "customerId": 1,
                "merchantId": packager,
                "couponId": null,
                "status": "packaged",
            },
        }])
    );

    let body: Value = test::call_and_read_body_json(&app, list(packager, "?status=shipped")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let body: Value = test::call_and_read_body_json(&app, list(shipper, "?status=shipped")).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["attributes"]["couponId"], coupon.id);
    assert_eq!(data[1]["attributes"]["couponId"], Value::Null);

    let body: Value = test::call_and_read_body_json(&app, list(packager, "")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let res = test::call_service(&app, list(packager, "?status=lost")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test::call_service(&app, list(100000, "?status=shipped")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "error": "Merchant not found" }));
}
