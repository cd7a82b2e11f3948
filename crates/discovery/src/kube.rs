//! 쿠버네티스 네임스페이스에서 이미지 참조 수집
//!
//! 네임스페이스의 파드를 나열해 컨테이너 스펙의 이미지를 모읍니다.
//! 클라이언트 설정은 kubeconfig / in-cluster 기본 탐색을 따릅니다.

use ::k8s_openapi::api::core::v1::Pod;
use ::kube::api::ListParams;
use ::kube::{Api, Client};
use tracing::{debug, info};
use xray_core::DiscoveryError;

use crate::dedup_preserving_order;

/// 쿠버네티스 API 클라이언트 래퍼
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    /// 기본 설정(kubeconfig 또는 in-cluster)으로 접속합니다.
    ///
    /// # Errors
    ///
    /// 클라이언트 구성 실패 시 [`DiscoveryError::Kube`].
    pub async fn connect() -> Result<Self, DiscoveryError> {
        let client = Client::try_default()
            .await
            .map_err(|e| DiscoveryError::Kube(format!("failed to build client: {e}")))?;
        Ok(Self { client })
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 네임스페이스의 모든 파드에서 컨테이너 이미지를 모읍니다.
    ///
    /// 첫 등장 순서를 유지하며 중복을 제거합니다. init 컨테이너는
    /// 파드 기동 시에만 돌지만 클러스터에서 실행되는 코드인 것은
    /// 같으므로 함께 수집합니다.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::Kube`] — 파드 목록 조회 실패
    /// - [`DiscoveryError::NoImagesFound`] — 수집된 이미지가 없음
    pub async fn images_from_namespace(
        &self,
        namespace: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        info!(%namespace, "listing pod images");
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods.list(&ListParams::default()).await.map_err(|e| {
            DiscoveryError::Kube(format!("failed to list pods in '{namespace}': {e}"))
        })?;

        let mut images = Vec::new();
        for pod in list {
            let Some(spec) = pod.spec else { continue };
            for container in &spec.containers {
                if let Some(image) = &container.image {
                    images.push(image.clone());
                }
            }
            for container in spec.init_containers.iter().flatten() {
                if let Some(image) = &container.image {
                    images.push(image.clone());
                }
            }
        }
        debug!(count = images.len(), "collected pod images before dedup");

        let images = dedup_preserving_order(images);
        if images.is_empty() {
            return Err(DiscoveryError::NoImagesFound {
                source_kind: "namespace".to_owned(),
                target: namespace.to_owned(),
            });
        }
        Ok(images)
    }
}
