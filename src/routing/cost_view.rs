use super::{CostFunction, Path, Request};
use crate::dsa::graph::HashSet;
use crate::network::{EdgeId, Network, Seconds};

// cost factor for edges a rerouted request should stay away from.
// large enough that any path avoiding them is preferred, the edges
// themselves stay usable.
pub const COST_MULTIPLIER:f64 = 30000.0;

// the cost function as seen by one routing call. only the cost of
// penalized edges differs from the underlying function, registrations
// always land in the underlying function.
pub enum CostView<'a,F:CostFunction + ?Sized> {
    Base(&'a mut F),
    Inflated {
        inner:&'a mut F,
        penalized:HashSet<EdgeId>
    }
}

impl<'a,F:CostFunction + ?Sized> CostView<'a,F> {
    pub fn base(inner:&'a mut F) -> Self {
        Self::Base(inner)
    }
    pub fn inflated<I:IntoIterator<Item = EdgeId>>(inner:&'a mut F,penalized:I) -> Self {
        Self::Inflated {inner,penalized:penalized.into_iter().collect()}
    }
    fn inner(&self) -> &F {
        match self {
            Self::Base(inner) | Self::Inflated {inner,..} => inner
        }
    }
    fn inner_mut(&mut self) -> &mut F {
        match self {
            Self::Base(inner) | Self::Inflated {inner,..} => inner
        }
    }
    pub fn is_penalized(&self,edge:EdgeId) -> bool {
        match self {
            Self::Base(_) => false,
            Self::Inflated {penalized,..} => penalized.contains(&edge)
        }
    }
}

impl<F:CostFunction + ?Sized> CostFunction for CostView<'_,F> {
    fn has_access(&self,network:&Network,edge:EdgeId,request:&Request) -> bool {
        self.inner().has_access(network,edge,request)
    }
    fn cost(&self,network:&Network,edge:EdgeId,request:&Request) -> f64 {
        let cost = self.inner().cost(network,edge,request);
        if self.is_penalized(edge) {cost*COST_MULTIPLIER} else {cost}
    }
    fn delay(&self,network:&Network,edge:EdgeId,request:&Request) -> Seconds {
        self.inner().delay(network,edge,request)
    }
    fn register(&mut self,network:&Network,path:&Path,request:&Request) -> bool {
        self.inner_mut().register(network,path,request)
    }
    fn deregister(&mut self,network:&Network,path:&Path,request:&Request) -> bool {
        self.inner_mut().deregister(network,path,request)
    }
}

#[cfg(test)]
mod tests {
    use super::{CostView, COST_MULTIPLIER};
    use crate::network::Network;
    use crate::routing::admission::TokenBucketAdmission;
    use crate::routing::{CostFunction, Path, Request};

    #[test]
    fn test_only_penalized_costs_change() {
        let mut network = Network::new();
        let a = network.create_node("a");
        let b = network.create_node("b");
        let first_link = network.create_link(a,b,1000.0,0.0,&[100.0]).unwrap();
        let second_link = network.create_link(a,b,1000.0,0.0,&[100.0]).unwrap();
        let (first,second) = (network.queue_edges(first_link)[0],network.queue_edges(second_link)[0]);
        let request = Request::new(a,b,10.0,10.0,1.0);
        let mut admission = TokenBucketAdmission::new();

        {
            let mut view = CostView::inflated(&mut admission,[first]);
            assert_eq!(view.cost(&network,first,&request),COST_MULTIPLIER);
            assert_eq!(view.cost(&network,second,&request),1.0);
            assert_eq!(view.delay(&network,first,&request),0.1);
            assert!(view.has_access(&network,first,&request));
            // reservations go through to the wrapped function
            assert!(view.register(&network,&Path::new(vec![second]),&request));
        }
        assert_eq!(admission.reserved_rate(second),10.0);

        let view = CostView::base(&mut admission);
        assert_eq!(view.cost(&network,first,&request),1.0);
        assert!(!view.is_penalized(first));
    }
}
