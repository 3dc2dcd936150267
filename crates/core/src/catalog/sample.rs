use chrono::{DateTime, Duration, Utc};

use crate::models::{Product, Seller};

struct SampleListing {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    image_url: &'static str,
    category: &'static str,
    seller: (&'static str, &'static str, f32),
    initial_price: u64,
    current_bid: Option<u64>,
    is_auction_active: bool,
    location: &'static str,
    hours_ago: i64,
}

const LISTINGS: [SampleListing; 6] = [
    SampleListing {
        id: "1",
        title: "iPhone 14 Pro 256GB 스페이스 블랙",
        description: "상태 최상급, 케이스와 함께 판매합니다.",
        image_url: "https://images.unsplash.com/photo-1592750475338-74b7b21085ab?w=400&h=300&fit=crop",
        category: "전자기기",
        seller: ("seller1", "믿음직한판매자", 4.8),
        initial_price: 1_200_000,
        current_bid: None,
        is_auction_active: true,
        location: "서울 강남구",
        hours_ago: 2,
    },
    SampleListing {
        id: "2",
        title: "닌텐도 스위치 OLED 화이트",
        description: "게임 5개 포함, 거의 새 상품",
        image_url: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400&h=300&fit=crop",
        category: "게임",
        seller: ("seller2", "게임러버", 4.6),
        initial_price: 350_000,
        current_bid: Some(320_000),
        is_auction_active: true,
        location: "부산 해운대구",
        hours_ago: 5,
    },
    SampleListing {
        id: "3",
        title: "MacBook Air M2 512GB 실버",
        description: "2022년 구매, 무선마우스 포함",
        image_url: "https://images.unsplash.com/photo-1541807084-5b52b6ee5d1f?w=400&h=300&fit=crop",
        category: "노트북",
        seller: ("seller3", "애플매니아", 4.9),
        initial_price: 1_450_000,
        current_bid: None,
        is_auction_active: false,
        location: "대구 중구",
        hours_ago: 12,
    },
    SampleListing {
        id: "4",
        title: "갤럭시 버즈2 프로 화이트",
        description: "미개봉 새 상품, 정품 인증서 포함",
        image_url: "https://images.unsplash.com/photo-1590658268037-6bf12165a8df?w=400&h=300&fit=crop",
        category: "전자기기",
        seller: ("seller4", "전자제품왕", 4.7),
        initial_price: 180_000,
        current_bid: Some(160_000),
        is_auction_active: true,
        location: "인천 연수구",
        hours_ago: 8,
    },
    SampleListing {
        id: "5",
        title: "다이슨 V11 무선청소기",
        description: "사용감 있지만 성능 좋음, A/S 1년 남음",
        image_url: "https://images.unsplash.com/photo-1558618047-3c8c76ca7d13?w=400&h=300&fit=crop",
        category: "가전제품",
        seller: ("seller5", "깔끔한집", 4.4),
        initial_price: 450_000,
        current_bid: None,
        is_auction_active: false,
        location: "경기 수원시",
        hours_ago: 24,
    },
    SampleListing {
        id: "6",
        title: "Apple Watch Series 8 45mm",
        description: "스포츠 루프 밴드 3개 포함",
        image_url: "https://images.unsplash.com/photo-1510017098667-27dfc7150acb?w=400&h=300&fit=crop",
        category: "전자기기",
        seller: ("seller6", "시계수집가", 4.8),
        initial_price: 520_000,
        current_bid: Some(480_000),
        is_auction_active: true,
        location: "서울 마포구",
        hours_ago: 6,
    },
];

/// Sample listings with creation times relative to `now`.
pub fn products(now: DateTime<Utc>) -> Vec<Product> {
    LISTINGS
        .iter()
        .map(|listing| {
            let (seller_id, seller_name, rating) = listing.seller;
            Product {
                id: listing.id.to_string(),
                title: listing.title.to_string(),
                description: listing.description.to_string(),
                image_url: listing.image_url.to_string(),
                category: listing.category.to_string(),
                seller: Seller {
                    id: seller_id.to_string(),
                    name: seller_name.to_string(),
                    rating,
                },
                initial_price: listing.initial_price,
                current_bid: listing.current_bid,
                is_auction_active: listing.is_auction_active,
                auction_end_time: None,
                location: listing.location.to_string(),
                created_at: now - Duration::hours(listing.hours_ago),
            }
        })
        .collect()
}
