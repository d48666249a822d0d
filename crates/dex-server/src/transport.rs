use std::time::Duration;

use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

/// Lazily connected gRPC channel plus the per-call deadline.
///
/// Methods are invoked by their fully-qualified path so no generated client
/// stubs are needed.
#[derive(Clone)]
pub struct GrpcTransport {
    name: &'static str,
    channel: Channel,
    timeout: Duration,
}

impl GrpcTransport {
    pub fn connect_lazy(
        name: &'static str,
        addr: &str,
        timeout: Duration,
    ) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(addr.to_string())?
            .connect_timeout(timeout)
            .connect_lazy();
        Ok(Self {
            name,
            channel,
            timeout,
        })
    }

    async fn ready(&self) -> Result<tonic::client::Grpc<Channel>, Status> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("{} is not ready: {e}", self.name)))?;
        Ok(grpc)
    }

    pub async fn unary<Req, Res>(&self, method: &'static str, req: Req) -> Result<Res, Status>
    where
        Req: prost::Message + 'static,
        Res: prost::Message + Default + 'static,
    {
        let mut grpc = self.ready().await?;
        let mut request = Request::new(req);
        request.set_timeout(self.timeout);

        let path = PathAndQuery::from_static(method);
        let codec = ProstCodec::default();
        let resp = grpc.unary(request, path, codec).await?;
        Ok(resp.into_inner())
    }

    /// Opens a server stream. No deadline is set: followed log streams stay
    /// open until either side hangs up.
    pub async fn server_streaming<Req, Res>(
        &self,
        method: &'static str,
        req: Req,
    ) -> Result<Streaming<Res>, Status>
    where
        Req: prost::Message + 'static,
        Res: prost::Message + Default + 'static,
    {
        let mut grpc = self.ready().await?;
        let path = PathAndQuery::from_static(method);
        let codec = ProstCodec::default();
        let resp = grpc
            .server_streaming(Request::new(req), path, codec)
            .await?;
        Ok(resp.into_inner())
    }
}
