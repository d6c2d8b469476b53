//! Shuffle: multiset preserved, seedable, uniform

mod common;

use common::{ids, TestContext};
use queues_core::port::SeededRandomProvider;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::test]
async fn test_shuffle_preserves_items() -> anyhow::Result<()> {
    let ctx = TestContext::new().await;
    let queue = ctx.engine.create().await?;
    let widgets = ctx.widgets("w", 20).await;
    for w in &widgets {
        ctx.engine.push(&queue, w).await?;
    }
    // A duplicate must survive as a duplicate
    ctx.engine.push(&queue, &widgets[0]).await?;

    let mut before = ids(&ctx.engine.items(&queue).await?);
    ctx.engine.shuffle(&queue).await?;
    let mut after = ids(&ctx.engine.items(&queue).await?);

    assert_eq!(after.len(), 21);
    before.sort();
    after.sort();
    assert_eq!(before, after);
    ctx.engine.verify(&queue).await?;
    Ok(())
}

#[tokio::test]
async fn test_shuffle_of_short_queues_is_a_no_op() {
    let ctx = TestContext::new().await;
    let queue = ctx.engine.create().await.unwrap();
    ctx.engine.shuffle(&queue).await.unwrap();
    assert!(ctx.engine.is_empty(&queue).await.unwrap());

    let w = ctx.widget("only").await;
    ctx.engine.push(&queue, &w).await.unwrap();
    ctx.engine.shuffle(&queue).await.unwrap();
    assert!(ctx.engine.get(&queue, 0).await.unwrap().is(&w));
}

#[tokio::test]
async fn test_seeded_shuffles_are_reproducible() {
    let mut orders = Vec::new();
    for _ in 0..2 {
        let ctx = TestContext::with_engine(|engine| {
            engine.with_random(Arc::new(SeededRandomProvider::new(7)))
        })
        .await;
        let queue = ctx.engine.create().await.unwrap();
        for w in ctx.widgets("w", 10).await {
            ctx.engine.push(&queue, &w).await.unwrap();
        }
        ctx.engine.shuffle(&queue).await.unwrap();
        orders.push(ids(&ctx.engine.items(&queue).await.unwrap()));
    }
    assert_eq!(orders[0], orders[1]);
}

#[tokio::test]
async fn test_every_order_is_equally_likely() -> anyhow::Result<()> {
    let ctx = TestContext::with_engine(|engine| {
        engine.with_random(Arc::new(SeededRandomProvider::new(2024)))
    })
    .await;
    let queue = ctx.engine.create().await?;
    for w in ctx.widgets("w", 3).await {
        ctx.engine.push(&queue, &w).await?;
    }

    const ROUNDS: usize = 600;
    let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
    for _ in 0..ROUNDS {
        ctx.engine.shuffle(&queue).await?;
        let order = ctx
            .engine
            .slots(&queue)
            .await?
            .into_iter()
            .map(|s| s.item.entity_id)
            .collect();
        *counts.entry(order).or_default() += 1;
    }

    // 3! orders, 100 expected each; bounds sit past four standard deviations
    assert_eq!(counts.len(), 6, "not every order occurred: {:?}", counts);
    for (order, count) in &counts {
        assert!(
            (60..=140).contains(count),
            "order {:?} came up {} times in {}",
            order,
            count,
            ROUNDS
        );
    }
    ctx.engine.verify(&queue).await?;
    Ok(())
}
