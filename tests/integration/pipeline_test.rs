// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::helpers::*;
use leadrs::application::use_cases::ingest_leads::{IngestionPipeline, PipelineConfig};
use leadrs::domain::repositories::lead_repository::LeadRepository;
use leadrs::queue::job_gate::{BusyPolicy, JobGate};
use leadrs::utils::errors::{InvalidQueryError, ScrapeError};
use std::sync::Arc;
use std::time::Duration;

/// 首次采集：三条结果，两条没有网站
#[tokio::test]
async fn test_first_run_commits_all_listings() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers());
    let pipeline = pipeline(repository.clone(), &driver);

    let job = pipeline.run(QUERY).await.expect("job should succeed");

    assert_eq!(job.leads_added, 3);
    assert_eq!(job.high_priority, 2);
    assert_eq!(job.query, QUERY);

    let stored = repository.list(false).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].name, "Ace Plumbing");
    assert_eq!(stored[0].category.as_deref(), Some("Plumber"));
    assert_eq!(stored[0].address.as_deref(), Some("12 High St, Manchester"));
    assert_eq!(stored[2].website.as_deref(), Some("https://cranedrains.co.uk/"));
    assert!(stored.iter().all(|lead| lead.query == QUERY));

    assert_eq!(driver.stats.opened(), 1);
    assert_eq!(driver.stats.closed(), 1);
}

/// 再次采集：只有新出现的商家被写入
#[tokio::test]
async fn test_rerun_only_adds_new_listing() {
    let repository = setup_repository().await;
    let first = manchester_plumbers();
    let driver = FakeDriver::serving(&first[..2]);
    pipeline(repository.clone(), &driver).run(QUERY).await.unwrap();

    let mut second = first[..2].to_vec();
    second.push(Listing::new("Drip Doctors", "3 Oxford Rd, Manchester").with_website("dripdoctors.com"));
    let driver = FakeDriver::serving(&second);
    let job = pipeline(repository.clone(), &driver).run(QUERY).await.unwrap();

    assert_eq!(job.leads_added, 1);
    assert_eq!(job.high_priority, 0);
    assert_eq!(job.diagnostics.known_duplicates, 2);
    assert_eq!(job.leads[0].website.as_deref(), Some("https://dripdoctors.com/"));
    assert_eq!(repository.list(false).await.unwrap().len(), 3);
}

/// 相同结果重复采集不会产生新线索
#[tokio::test]
async fn test_identical_rerun_is_idempotent() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers());
    let pipeline = pipeline(repository.clone(), &driver);

    pipeline.run(QUERY).await.unwrap();
    let job = pipeline.run(QUERY).await.unwrap();

    assert_eq!(job.leads_added, 0);
    assert_eq!(job.high_priority, 0);
    assert_eq!(job.diagnostics.known_duplicates, 3);
    assert_eq!(repository.list(false).await.unwrap().len(), 3);
    assert_eq!(driver.stats.closed(), 2);
}

/// 拦截页：任务失败且不写入任何线索
#[tokio::test]
async fn test_blocked_page_fails_without_commits() {
    let repository = setup_repository().await;
    let driver = FakeDriver::new(vec![blocked_page()]);
    let pipeline = pipeline(repository.clone(), &driver);

    let err = pipeline.run(QUERY).await.unwrap_err();

    assert!(matches!(err, ScrapeError::Blocked(_)));
    assert_eq!(err.kind(), "blocked");
    assert!(repository.list(false).await.unwrap().is_empty());
    // 被拦截不重试
    assert_eq!(driver.stats.gotos(), 1);
    assert_eq!(driver.stats.closed(), 1);
}

/// 结果已加载但页面被重定向到 /sorry 时同样视为拦截
#[tokio::test]
async fn test_sorry_redirect_is_blocked() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers())
        .with_url("https://www.google.com/sorry/index?continue=https://www.google.com/maps");
    let pipeline = pipeline(repository.clone(), &driver);

    let err = pipeline.run(QUERY).await.unwrap_err();

    assert!(matches!(err, ScrapeError::Blocked(_)));
    assert!(repository.list(false).await.unwrap().is_empty());
    assert_eq!(driver.stats.closed(), 1);
}

/// 空查询在打开浏览器之前就被拒绝
#[tokio::test]
async fn test_empty_query_never_opens_browser() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers());
    let pipeline = pipeline(repository, &driver);

    for query in ["", "   \t\n "] {
        let err = pipeline.run(query).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::InvalidQuery(InvalidQueryError::Empty)
        ));
    }
    assert_eq!(driver.stats.opened(), 0);
}

/// 名称和地址只在大小写、标点上不同的条目视为同一商家
#[tokio::test]
async fn test_dedup_ignores_case_and_punctuation() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&[
        Listing::new("Ace Plumbing", "12 High St, Manchester"),
        Listing::new("ACE PLUMBING", "12 High St., Manchester"),
        Listing::new("Ace Plumbing", "40 King St, Manchester"),
    ]);

    let job = pipeline(repository.clone(), &driver).run(QUERY).await.unwrap();

    assert_eq!(job.leads_added, 2);
    assert_eq!(job.diagnostics.batch_duplicates, 1);

    let driver = FakeDriver::serving(&[Listing::new("ace plumbing", "12 HIGH ST MANCHESTER")]);
    let job = pipeline(repository.clone(), &driver).run("Plumbers  in  Manchester").await.unwrap();

    assert_eq!(job.leads_added, 0);
    assert_eq!(job.diagnostics.known_duplicates, 1);
}

/// 单条写入失败只计数，其余线索照常写入
#[tokio::test]
async fn test_commit_failure_is_isolated() {
    let inner = setup_repository().await;
    let repository = Arc::new(FlakyRepository {
        inner: inner.clone(),
        fail_on: "Bolt Heating".to_string(),
        fail_lookups: false,
    });
    let driver = FakeDriver::serving(&manchester_plumbers());

    let job = pipeline(repository, &driver).run(QUERY).await.unwrap();

    assert_eq!(job.leads_added, 2);
    assert_eq!(job.high_priority, 1);
    assert_eq!(job.diagnostics.commit_failures, 1);

    let names: Vec<_> = inner
        .list(false)
        .await
        .unwrap()
        .into_iter()
        .map(|lead| lead.name)
        .collect();
    assert_eq!(names, vec!["Ace Plumbing", "Crane Drains"]);
}

/// 去重查询失败时整个任务失败
#[tokio::test]
async fn test_store_lookup_failure_fails_job() {
    let inner = setup_repository().await;
    let repository = Arc::new(FlakyRepository {
        inner: inner.clone(),
        fail_on: String::new(),
        fail_lookups: true,
    });
    let driver = FakeDriver::serving(&manchester_plumbers());

    let err = pipeline(repository, &driver).run(QUERY).await.unwrap_err();

    assert_eq!(err.kind(), "store");
    assert!(inner.list(false).await.unwrap().is_empty());
    assert_eq!(driver.stats.closed(), 1);
}

/// 浏览器阶段超过任务时限时返回超时并释放会话
#[tokio::test]
async fn test_job_timeout_releases_session() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers()).with_goto_delay(Duration::from_millis(500));
    let config = PipelineConfig {
        job_timeout: Duration::from_millis(50),
        ..fast_pipeline_config()
    };

    let err = pipeline_with(repository.clone(), &driver, config)
        .run(QUERY)
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::JobTimeout(_)));
    assert_eq!(err.kind(), "job_timeout");
    assert_eq!(driver.stats.opened(), 1);
    assert_eq!(driver.stats.closed(), 1);
    assert!(repository.list(false).await.unwrap().is_empty());
}

/// 暂时性导航失败会被重试
#[tokio::test]
async fn test_transient_navigation_failure_is_retried() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers()).with_goto_failures(1);

    let job = pipeline(repository, &driver).run(QUERY).await.unwrap();

    assert_eq!(job.leads_added, 3);
    assert_eq!(driver.stats.gotos(), 2);
}

/// 重试耗尽后返回导航超时
#[tokio::test]
async fn test_navigation_timeout_after_retries() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers()).with_goto_failures(10);

    let err = pipeline(repository, &driver).run(QUERY).await.unwrap_err();

    assert!(matches!(err, ScrapeError::NavigationTimeout(_)));
    // 首次尝试加两次重试
    assert_eq!(driver.stats.gotos(), 3);
    assert_eq!(driver.stats.closed(), 1);
}

/// 主内容始终不出现时返回导航超时
#[tokio::test]
async fn test_missing_content_times_out() {
    let repository = setup_repository().await;
    let driver = FakeDriver::new(vec!["<html><body><div id=\"app\"></div></body></html>".to_string()]);

    let err = pipeline(repository, &driver).run(QUERY).await.unwrap_err();

    assert_eq!(err.kind(), "navigation_timeout");
    assert_eq!(driver.stats.gotos(), 3);
}

/// 无法启动浏览器
#[tokio::test]
async fn test_launch_failure_is_browser_error() {
    let repository = setup_repository().await;
    let driver = FakeDriver::failing_launch();

    let err = pipeline(repository, &driver).run(QUERY).await.unwrap_err();

    assert!(matches!(err, ScrapeError::SessionUnavailable(_)));
    assert_eq!(err.kind(), "browser");
    assert_eq!(driver.stats.closed(), 0);
}

/// 滚动加载后的所有结果都会被提取
#[tokio::test]
async fn test_expansion_collects_lazily_loaded_listings() {
    let repository = setup_repository().await;
    let all: Vec<Listing> = (1..=5)
        .map(|i| Listing::new(&format!("Plumber {}", i), &format!("{} Canal St, Manchester", i)))
        .collect();
    let driver = FakeDriver::new(vec![
        results_page(&all[..2], false),
        results_page(&all[..4], false),
        results_page(&all, true),
    ]);

    let job = pipeline(repository, &driver).run(QUERY).await.unwrap();

    assert_eq!(job.leads_added, 5);
    assert_eq!(job.diagnostics.expand_iterations, 2);
    assert_eq!(driver.stats.scrolls(), 2);
}

/// 查询只命中一个地点时直接读取详情面板
#[tokio::test]
async fn test_single_place_page() {
    let repository = setup_repository().await;
    let page = r#"<html><body><div role="main" aria-label="Ace Plumbing">
        <h1 class="DUwDvf">Ace Plumbing</h1>
        <button class="DkEaL">Plumber</button>
        <button data-item-id="address" aria-label="Address: 12 High St, Manchester">12 High St</button>
        <button data-item-id="phone:tel:01611234567" aria-label="Phone: 0161 123 4567">0161 123 4567</button>
        </div></body></html>"#;
    let driver = FakeDriver::new(vec![page.to_string()]);

    let job = pipeline(repository, &driver).run("Ace Plumbing Manchester").await.unwrap();

    assert_eq!(job.leads_added, 1);
    assert_eq!(job.high_priority, 1);
    assert_eq!(job.diagnostics.expand_iterations, 0);
    assert_eq!(driver.stats.scrolls(), 0);

    let lead = &job.leads[0];
    assert_eq!(lead.address.as_deref(), Some("12 High St, Manchester"));
    assert_eq!(lead.phone.as_deref(), Some("0161 123 4567"));
}

/// 超过 max_results 的条目被截断；0 表示不限制
#[tokio::test]
async fn test_max_results_truncates_in_page_order() {
    let listings: Vec<Listing> = (1..=25)
        .map(|i| Listing::new(&format!("Business {}", i), &format!("{} High St, Leeds", i)))
        .collect();

    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&listings);
    let job = pipeline(repository.clone(), &driver).run(QUERY).await.unwrap();

    assert_eq!(job.leads_added, 20);
    assert_eq!(job.diagnostics.listings_truncated, 5);
    let stored = repository.list(false).await.unwrap();
    assert_eq!(stored.last().unwrap().name, "Business 20");

    let repository = setup_repository().await;
    let config = PipelineConfig {
        max_results: 0,
        ..fast_pipeline_config()
    };
    let job = pipeline_with(repository, &driver, config).run(QUERY).await.unwrap();
    assert_eq!(job.leads_added, 25);
}

/// 拒绝策略下并发任务立即返回忙碌
#[tokio::test]
async fn test_reject_policy_refuses_concurrent_job() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers()).with_goto_delay(Duration::from_millis(200));
    let pipeline = Arc::new(IngestionPipeline::new(
        repository,
        Arc::new(driver.clone()),
        JobGate::new(BusyPolicy::Reject, Duration::ZERO),
        fast_pipeline_config(),
    ));

    let running = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.run(QUERY).await.map(|job| job.leads_added) })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = pipeline.run(QUERY).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Busy));

    assert_eq!(running.await.unwrap().unwrap(), 3);
    assert_eq!(driver.stats.opened(), 1);
}

/// 排队策略下任务依次执行，浏览器不会被同时占用
#[tokio::test]
async fn test_queue_policy_serializes_jobs() {
    let repository = setup_repository().await;
    let driver = FakeDriver::serving(&manchester_plumbers()).with_goto_delay(Duration::from_millis(50));
    let pipeline = Arc::new(pipeline(repository.clone(), &driver));

    let first = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.run(QUERY).await.map(|job| job.leads_added) })
    };
    let second = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.run(QUERY).await.map(|job| job.leads_added) })
    };

    let mut added = vec![first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];
    added.sort();

    assert_eq!(added, vec![0, 3]);
    assert_eq!(driver.stats.opened(), 2);
    assert_eq!(driver.stats.closed(), 2);
    assert_eq!(repository.list(false).await.unwrap().len(), 3);
}
