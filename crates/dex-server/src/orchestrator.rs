//! Client side of the generic resource orchestrator.

use dex_proto::entropy_v1beta1::{
    ApplyActionRequest, ApplyActionResponse, CreateResourceRequest, CreateResourceResponse,
    DeleteResourceRequest, DeleteResourceResponse, GetLogRequest, GetLogResponse,
    GetResourceRequest, GetResourceResponse, ListResourcesRequest, ListResourcesResponse,
    LogChunk, Resource, UpdateResourceRequest, UpdateResourceResponse, resource_service,
};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tonic::Status;

use crate::transport::GrpcTransport;

pub type LogStream = BoxStream<'static, Result<LogChunk, Status>>;

#[tonic::async_trait]
pub trait ResourceService: Send + Sync + 'static {
    async fn list_resources(&self, project: &str, kind: &str) -> Result<Vec<Resource>, Status>;

    async fn get_resource(&self, urn: &str) -> Result<Resource, Status>;

    async fn create_resource(&self, resource: Resource) -> Result<Resource, Status>;

    async fn update_resource(&self, req: UpdateResourceRequest) -> Result<Resource, Status>;

    async fn delete_resource(&self, urn: &str) -> Result<(), Status>;

    async fn apply_action(&self, req: ApplyActionRequest) -> Result<Resource, Status>;

    /// Opens the log stream of a resource. Dropping the stream cancels the
    /// call on the orchestrator.
    async fn get_log(&self, req: GetLogRequest) -> Result<LogStream, Status>;
}

fn require_resource(resource: Option<Resource>) -> Result<Resource, Status> {
    resource.ok_or_else(|| Status::internal("orchestrator response has no resource"))
}

#[derive(Clone)]
pub struct GrpcResourceService {
    transport: GrpcTransport,
}

impl GrpcResourceService {
    pub fn new(transport: GrpcTransport) -> Self {
        Self { transport }
    }
}

#[tonic::async_trait]
impl ResourceService for GrpcResourceService {
    async fn list_resources(&self, project: &str, kind: &str) -> Result<Vec<Resource>, Status> {
        let req = ListResourcesRequest {
            project: project.to_string(),
            kind: kind.to_string(),
        };
        let resp: ListResourcesResponse = self
            .transport
            .unary(resource_service::LIST_RESOURCES, req)
            .await?;
        Ok(resp.resources)
    }

    async fn get_resource(&self, urn: &str) -> Result<Resource, Status> {
        let req = GetResourceRequest {
            urn: urn.to_string(),
        };
        let resp: GetResourceResponse = self
            .transport
            .unary(resource_service::GET_RESOURCE, req)
            .await?;
        require_resource(resp.resource)
    }

    async fn create_resource(&self, resource: Resource) -> Result<Resource, Status> {
        let req = CreateResourceRequest {
            resource: Some(resource),
        };
        let resp: CreateResourceResponse = self
            .transport
            .unary(resource_service::CREATE_RESOURCE, req)
            .await?;
        require_resource(resp.resource)
    }

    async fn update_resource(&self, req: UpdateResourceRequest) -> Result<Resource, Status> {
        let resp: UpdateResourceResponse = self
            .transport
            .unary(resource_service::UPDATE_RESOURCE, req)
            .await?;
        require_resource(resp.resource)
    }

    async fn delete_resource(&self, urn: &str) -> Result<(), Status> {
        let req = DeleteResourceRequest {
            urn: urn.to_string(),
        };
        let _: DeleteResourceResponse = self
            .transport
            .unary(resource_service::DELETE_RESOURCE, req)
            .await?;
        Ok(())
    }

    async fn apply_action(&self, req: ApplyActionRequest) -> Result<Resource, Status> {
        let resp: ApplyActionResponse = self
            .transport
            .unary(resource_service::APPLY_ACTION, req)
            .await?;
        require_resource(resp.resource)
    }

    async fn get_log(&self, req: GetLogRequest) -> Result<LogStream, Status> {
        let stream = self
            .transport
            .server_streaming::<_, GetLogResponse>(resource_service::GET_LOG, req)
            .await?;
        Ok(stream
            .map(|item| item.map(|resp| resp.chunk.unwrap_or_default()))
            .boxed())
    }
}
